//! One conversion request, archive bytes in, package bytes out

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::archive::extract_archive;
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::records::load_records;

use super::builder::build_package;
use super::naming::{data_file_stem, resolve_output_name};

/// Content type the package is delivered with
pub const PACKAGE_MIME_TYPE: &str = "application/octet-stream";

/// A finished conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedPackage {
    /// Download name, requested name plus the package extension
    pub file_name: String,
    pub deck_name: String,
    /// Data file the notes came from, relative to the archive root
    pub data_file: String,
    pub note_count: usize,
    pub media_files: Vec<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ConvertedPackage {
    /// Message shown to the requester after a successful conversion
    pub fn summary(&self) -> String {
        format!("APKG file created: {}", self.file_name)
    }
}

/// Convert an uploaded archive using scratch space in the system temp dir
pub fn convert_archive(
    archive: Option<&[u8]>,
    output_name: &str,
    config: &ConverterConfig,
) -> Result<ConvertedPackage> {
    convert_archive_in(archive, output_name, config, &std::env::temp_dir())
}

/// Convert an uploaded archive, with the request's scratch directory
/// created under `scratch_root`.
///
/// The scratch directory is removed before returning, whether the
/// conversion succeeded or not.
pub fn convert_archive_in(
    archive: Option<&[u8]>,
    output_name: &str,
    config: &ConverterConfig,
    scratch_root: &Path,
) -> Result<ConvertedPackage> {
    let archive = match archive {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(ConvertError::MissingInput),
    };
    config.validate()?;

    let scratch = tempfile::Builder::new()
        .prefix("deckpress-")
        .tempdir_in(scratch_root)?;
    log::debug!("Scratch directory {:?}", scratch.path());

    let result = convert_in(archive, output_name, config, scratch.path());

    if let Err(e) = scratch.close() {
        log::warn!("Failed to remove scratch directory: {}", e);
    }

    match &result {
        Ok(package) => log::info!("{}", package.summary()),
        Err(e) => log::info!("Conversion failed: {}", e),
    }
    result
}

fn convert_in(
    archive: &[u8],
    output_name: &str,
    config: &ConverterConfig,
    scratch: &Path,
) -> Result<ConvertedPackage> {
    let tree = extract_archive(archive, scratch, config)?;
    let data_file = tree.relative(&tree.data_file);
    log::info!("Reading cards from {}", data_file);

    let output_name = resolve_output_name(output_name, &tree.data_file, config);
    let records = load_records(&tree.data_file, config)?;

    let built = build_package(
        &records,
        tree.asset_dir.as_deref(),
        &output_name,
        &data_file_stem(&tree.data_file),
        config,
        scratch,
    )?;

    let bytes = fs::read(&built.path)?;

    Ok(ConvertedPackage {
        file_name: built.file_name,
        deck_name: built.deck_name,
        data_file,
        note_count: built.note_count,
        media_files: built.media_files,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;
    use crate::apkg::read_package_bytes;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            for (name, content) in entries {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    fn convert(archive: &[u8], output_name: &str) -> Result<ConvertedPackage> {
        convert_archive(Some(archive), output_name, &ConverterConfig::default())
    }

    #[test]
    fn test_cat_scenario() {
        let archive = zip_bytes(&[
            (
                "cards.csv",
                "Question,Answer\n\"<img src=\"\"images/cat.png\"\">\",\"Cat\"\n",
            ),
            ("images/cat.png", "not really a png"),
        ]);

        let package = convert(&archive, "diana-flashcards").unwrap();

        assert_eq!(package.file_name, "cards.apkg");
        assert_eq!(package.deck_name, "cards");
        assert_eq!(package.data_file, "cards.csv");
        assert_eq!(package.note_count, 1);
        assert_eq!(package.media_files, vec!["cat.png".to_string()]);
        assert_eq!(package.summary(), "APKG file created: cards.apkg");

        let summary = read_package_bytes(&package.bytes).unwrap();
        assert_eq!(summary.deck_names, vec!["cards".to_string()]);
        assert_eq!(summary.notes.len(), 1);
        assert_eq!(summary.notes[0].fields, vec![r#"<img src="cat.png">"#, "Cat"]);
        assert_eq!(summary.media, vec!["cat.png".to_string()]);
    }

    #[test]
    fn test_rows_become_notes_in_order() {
        let mut csv = String::from("Question,Answer,Hint\n");
        for i in 0..25 {
            csv.push_str(&format!("Q{},A{},h{}\n", i, i, i));
        }
        let archive = zip_bytes(&[("deck/list.csv", csv.as_str())]);

        let package = convert(&archive, "vocab").unwrap();
        let summary = read_package_bytes(&package.bytes).unwrap();

        assert_eq!(package.file_name, "vocab.apkg");
        assert_eq!(summary.notes.len(), 25);
        for (i, note) in summary.notes.iter().enumerate() {
            assert_eq!(note.fields, vec![format!("Q{}", i), format!("A{}", i)]);
        }
        assert!(summary.media.is_empty());
    }

    #[test]
    fn test_requested_name_with_extension() {
        let archive = zip_bytes(&[("cards.csv", "Question,Answer\nQ,A\n")]);

        let package = convert(&archive, "Biology.APKG").unwrap();
        assert_eq!(package.file_name, "Biology.APKG");
        assert_eq!(package.deck_name, "Biology");
    }

    #[test]
    fn test_missing_cells_become_empty_text() {
        let archive = zip_bytes(&[("cards.csv", "Question,Answer\n42\n,\n")]);

        let package = convert(&archive, "numbers").unwrap();
        let summary = read_package_bytes(&package.bytes).unwrap();

        assert_eq!(summary.notes[0].fields, vec!["42", ""]);
        assert_eq!(summary.notes[1].fields, vec!["", ""]);
    }

    #[test]
    fn test_no_csv_aborts() {
        let archive = zip_bytes(&[("images/cat.png", "png"), ("readme.txt", "hi")]);

        let err = convert(&archive, "diana-flashcards").unwrap_err();
        assert!(matches!(err, ConvertError::MissingDataFile { .. }));
        assert_eq!(err.to_string(), "No CSV file found in the ZIP.");
    }

    #[test]
    fn test_missing_input() {
        let config = ConverterConfig::default();
        assert!(matches!(
            convert_archive(None, "x", &config),
            Err(ConvertError::MissingInput)
        ));
        assert!(matches!(
            convert_archive(Some(&[][..]), "x", &config),
            Err(ConvertError::MissingInput)
        ));
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let archive = zip_bytes(&[("cards.csv", "Front,Back\nQ,A\n")]);

        let err = convert(&archive, "x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cards.csv is missing required column(s): Question, Answer"
        );
    }

    #[test]
    fn test_scratch_removed_on_success_and_failure() {
        let root = TempDir::new().unwrap();
        let config = ConverterConfig::default();

        let good = zip_bytes(&[("cards.csv", "Question,Answer\nQ,A\n")]);
        convert_archive_in(Some(good.as_slice()), "x", &config, root.path()).unwrap();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);

        let bad = zip_bytes(&[("cards.txt", "nope")]);
        convert_archive_in(Some(bad.as_slice()), "x", &config, root.path()).unwrap_err();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
