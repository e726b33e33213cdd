//! Preview what an archive would convert into, without building a package

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::archive::extract_archive;
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::records::{missing_columns, normalize_records, read_table, Record};

use super::builder::collect_media;
use super::naming::{package_file_name, resolve_output_name};

/// Preview metadata for an archive
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePreview {
    /// Selected data file, relative to the archive root
    pub data_file: String,
    /// Selected image folder, relative to the archive root
    pub asset_folder: Option<String>,
    pub columns: Vec<String>,
    /// Required columns the data file lacks
    pub missing_columns: Vec<String>,
    pub row_count: usize,
    pub media_count: usize,
    /// Package name used when the output name is left at its default
    pub suggested_file_name: String,
    /// Image references with no media file of that name
    pub dangling_references: Vec<String>,
    /// Media files no card refers to
    pub unused_media: Vec<String>,
}

fn image_source_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src="([^"]+)""#).expect("valid image source regex"))
}

/// `src="..."` targets in the question and answer of every record
fn referenced_files(records: &[Record], config: &ConverterConfig) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    for record in records {
        for column in [&config.columns.question, &config.columns.answer] {
            if let Some(text) = record.get(column).as_text() {
                for caps in image_source_regex().captures_iter(text) {
                    refs.insert(caps[1].to_string());
                }
            }
        }
    }
    refs
}

fn is_remote(reference: &str) -> bool {
    reference.contains("://") || reference.starts_with("data:")
}

/// Unpack the archive into `scratch` and report on it
pub fn preview_archive(
    archive: &[u8],
    scratch: &Path,
    config: &ConverterConfig,
) -> Result<ArchivePreview> {
    if archive.is_empty() {
        return Err(ConvertError::MissingInput);
    }

    let tree = extract_archive(archive, scratch, config)?;
    let table = read_table(&tree.data_file)?;
    let missing = missing_columns(&table, &config.columns);
    let columns = table.headers.clone();
    let row_count = table.records.len();

    let records = normalize_records(table, &config.columns, &config.archive.asset_folder);

    let media: BTreeSet<String> = match &tree.asset_dir {
        Some(dir) => collect_media(dir)?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect(),
        None => BTreeSet::new(),
    };

    let refs = referenced_files(&records, config);
    let dangling_references = refs
        .iter()
        .filter(|r| !is_remote(r) && !media.contains(*r))
        .cloned()
        .collect();
    let unused_media = media.iter().filter(|m| !refs.contains(*m)).cloned().collect();

    let output_name = resolve_output_name("", &tree.data_file, config);

    Ok(ArchivePreview {
        data_file: tree.relative(&tree.data_file),
        asset_folder: tree.asset_dir.as_ref().map(|d| tree.relative(d)),
        columns,
        missing_columns: missing,
        row_count,
        media_count: media.len(),
        suggested_file_name: package_file_name(&output_name, config),
        dangling_references,
        unused_media,
    })
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

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

    #[test]
    fn test_preview_reports_media_mismatches() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[
            (
                "set/Animals.csv",
                "Question,Answer\n\"<img src=\"\"images/cat.png\"\">\",Cat\n\"<img src=\"\"images/dog.png\"\">\",Dog\n\"<img src=\"\"https://example.com/x.png\"\">\",Web\n",
            ),
            ("set/images/cat.png", "png"),
            ("set/images/bird.png", "png"),
        ]);

        let preview = preview_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();

        assert_eq!(preview.data_file, "set/Animals.csv");
        assert_eq!(preview.asset_folder.as_deref(), Some("set/images"));
        assert_eq!(preview.columns, vec!["Question", "Answer"]);
        assert!(preview.missing_columns.is_empty());
        assert_eq!(preview.row_count, 3);
        assert_eq!(preview.media_count, 2);
        assert_eq!(preview.suggested_file_name, "Animals.apkg");
        assert_eq!(preview.dangling_references, vec!["dog.png".to_string()]);
        assert_eq!(preview.unused_media, vec!["bird.png".to_string()]);
    }

    #[test]
    fn test_preview_reports_missing_columns() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[("cards.csv", "Front,Answer\na,b\n")]);

        let preview = preview_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();

        assert_eq!(preview.missing_columns, vec!["Question".to_string()]);
        assert_eq!(preview.asset_folder, None);
        assert_eq!(preview.media_count, 0);
    }

    #[test]
    fn test_preview_without_csv_fails() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[("notes.md", "# hi")]);

        assert!(matches!(
            preview_archive(&archive, temp_dir.path(), &ConverterConfig::default()),
            Err(ConvertError::MissingDataFile { .. })
        ));
    }
}
