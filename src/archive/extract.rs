//! Unpacking an uploaded ZIP and finding the CSV file and image folder in it

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};

/// Where the uploaded blob is stored inside the scratch directory
const ARCHIVE_FILE_NAME: &str = "input.zip";

/// Directory inside the scratch directory the archive is unpacked into
const CONTENTS_DIR: &str = "contents";

/// Folder macOS adds to ZIPs made in Finder
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Folder view settings Finder leaves in every directory it opens
const MACOS_FOLDER_SETTINGS: &str = ".DS_Store";

/// The unpacked archive and the inputs selected from it
#[derive(Debug, Clone)]
pub struct ExtractedTree {
    /// Root of the unpacked contents
    pub root: PathBuf,
    /// The selected tabular file
    pub data_file: PathBuf,
    /// The selected image folder, if the archive has one
    pub asset_dir: Option<PathBuf>,
}

impl ExtractedTree {
    /// Path of `path` relative to the unpacked root, for messages
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Write the archive into `scratch`, unpack it and select the inputs.
///
/// The caller owns `scratch` and removes it when the request ends.
pub fn extract_archive(
    archive: &[u8],
    scratch: &Path,
    config: &ConverterConfig,
) -> Result<ExtractedTree> {
    let archive_path = scratch.join(ARCHIVE_FILE_NAME);
    fs::write(&archive_path, archive)?;

    let root = scratch.join(CONTENTS_DIR);
    fs::create_dir_all(&root)?;

    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    log::debug!("Unpacking {} entries into {:?}", zip.len(), root);
    zip.extract(&root).map_err(unpack_error)?;

    let (data_file, asset_dir) = locate_inputs(&root, config)?;
    Ok(ExtractedTree {
        root,
        data_file,
        asset_dir,
    })
}

/// Find the data file and the asset folder under `root`.
///
/// Entries are visited depth first in file-name order, so when several
/// candidates exist the lexicographically smallest path wins.
pub fn locate_inputs(root: &Path, config: &ConverterConfig) -> Result<(PathBuf, Option<PathBuf>)> {
    let data_suffix = config.data_suffix().to_lowercase();
    let asset_folder = config.archive.asset_folder.to_lowercase();

    let mut data_file: Option<PathBuf> = None;
    let mut asset_dir: Option<PathBuf> = None;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_platform_debris(e));

    for entry in walker {
        let entry = entry.map_err(|e| ConvertError::Io(std::io::Error::other(e.to_string())))?;
        let name = entry.file_name().to_string_lossy().to_lowercase();

        if entry.file_type().is_file() {
            if data_file.is_none() && name.ends_with(&data_suffix) {
                log::debug!("Selected data file {:?}", entry.path());
                data_file = Some(entry.path().to_path_buf());
            }
        } else if entry.file_type().is_dir() && asset_dir.is_none() && name == asset_folder {
            log::debug!("Selected asset folder {:?}", entry.path());
            asset_dir = Some(entry.path().to_path_buf());
        }

        if data_file.is_some() && asset_dir.is_some() {
            break;
        }
    }

    let data_file = data_file.ok_or_else(|| ConvertError::MissingDataFile {
        extension: config.archive.data_extension.clone(),
    })?;

    Ok((data_file, asset_dir))
}

/// Failures writing into scratch are ours; the rest mean a broken archive
fn unpack_error(err: ZipError) -> ConvertError {
    match err {
        ZipError::Io(e) => ConvertError::Io(e),
        other => ConvertError::Zip(other),
    }
}

/// `__MACOSX/` trees, `._name` resource forks and `.DS_Store` files are not
/// user content
pub fn is_platform_debris(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name == MACOS_METADATA_DIR || name == MACOS_FOLDER_SETTINGS || name.starts_with("._")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            for (name, content) in entries {
                if name.ends_with('/') {
                    zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
                } else {
                    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                    zip.write_all(content.as_bytes()).unwrap();
                }
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_extract_finds_csv_and_images() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[
            ("cards.csv", "Question,Answer\nQ,A\n"),
            ("images/cat.png", "png"),
        ]);

        let tree = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();

        assert_eq!(tree.relative(&tree.data_file), "cards.csv");
        assert_eq!(tree.relative(tree.asset_dir.as_ref().unwrap()), "images");
        assert!(temp_dir.path().join("input.zip").exists());
        assert!(tree.root.join("images/cat.png").exists());
    }

    #[test]
    fn test_nested_and_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[
            ("deck/Vocab.CSV", "Question,Answer\n"),
            ("deck/IMAGES/", ""),
            ("deck/IMAGES/dog.jpg", "jpg"),
        ]);

        let tree = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();

        assert_eq!(tree.relative(&tree.data_file), "deck/Vocab.CSV");
        assert_eq!(tree.relative(tree.asset_dir.as_ref().unwrap()), "deck/IMAGES");
    }

    #[test]
    fn test_missing_csv() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[("notes.txt", "nothing"), ("images/cat.png", "png")]);

        let err = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default())
            .unwrap_err();

        assert!(matches!(err, ConvertError::MissingDataFile { .. }));
        assert_eq!(err.to_string(), "No CSV file found in the ZIP.");
    }

    #[test]
    fn test_images_folder_is_optional() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[("cards.csv", "Question,Answer\n")]);

        let tree = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();
        assert!(tree.asset_dir.is_none());
    }

    #[test]
    fn test_first_csv_in_name_order_wins() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[
            ("zeta.csv", "Question,Answer\n"),
            ("b/inner.csv", "Question,Answer\n"),
            ("alpha.csv", "Question,Answer\n"),
        ]);

        let tree = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();
        assert_eq!(tree.relative(&tree.data_file), "alpha.csv");
    }

    #[test]
    fn test_skips_macos_debris() {
        let temp_dir = TempDir::new().unwrap();
        let archive = zip_bytes(&[
            ("__MACOSX/._cards.csv", "\0\x05\x16\x07"),
            ("._cards.csv", "\0\x05\x16\x07"),
            ("cards.csv", "Question,Answer\n"),
        ]);

        let tree = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default()).unwrap();
        assert_eq!(tree.relative(&tree.data_file), "cards.csv");
    }

    #[test]
    fn test_invalid_zip() {
        let temp_dir = TempDir::new().unwrap();
        let err = extract_archive(b"definitely not a zip", temp_dir.path(), &ConverterConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Zip(_)));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_unpack_error_classification() {
        let err = unpack_error(ZipError::Io(std::io::Error::other("disk full")));
        assert!(matches!(err, ConvertError::Io(_)));
        assert!(!err.is_user_error());

        let err = unpack_error(ZipError::FileNotFound);
        assert!(matches!(err, ConvertError::Zip(_)));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_scratch_write_failure_is_not_a_user_error() {
        let temp_dir = TempDir::new().unwrap();
        // A plain file where the archive needs a directory
        let contents = temp_dir.path().join(CONTENTS_DIR);
        fs::create_dir_all(&contents).unwrap();
        fs::write(contents.join("images"), b"in the way").unwrap();

        let archive = zip_bytes(&[
            ("cards.csv", "Question,Answer\n"),
            ("images/cat.png", "png"),
        ]);

        let err = extract_archive(&archive, temp_dir.path(), &ConverterConfig::default())
            .unwrap_err();
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_custom_asset_folder_and_extension() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ConverterConfig::default();
        config.archive.asset_folder = "media".to_string();
        config.archive.data_extension = "tsv".to_string();

        let archive = zip_bytes(&[
            ("cards.csv", "ignored"),
            ("cards.tsv", "Question\tAnswer\n"),
            ("media/x.png", "png"),
        ]);

        let tree = extract_archive(&archive, temp_dir.path(), &config).unwrap();
        assert_eq!(tree.relative(&tree.data_file), "cards.tsv");
        assert_eq!(tree.relative(tree.asset_dir.as_ref().unwrap()), "media");
    }
}
