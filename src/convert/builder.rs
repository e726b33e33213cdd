//! Building the package from normalized records

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::apkg::{Deck, Model, Note, Package};
use crate::archive::is_platform_debris;
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::records::Record;

use super::naming::{deck_name, disk_file_name, package_file_name};

/// What `build_package` wrote
#[derive(Debug, Clone)]
pub struct BuiltPackage {
    /// Where the package was written
    pub path: PathBuf,
    /// Name offered to the requester
    pub file_name: String,
    pub deck_name: String,
    pub note_count: usize,
    /// Bare names of the bundled media files
    pub media_files: Vec<String>,
}

/// Every file under the asset folder, sorted by path, leaving out macOS
/// debris.
///
/// Media is addressed by bare file name inside a package, so a second file
/// with an already-seen name is skipped.
pub fn collect_media(asset_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut media = Vec::new();

    let walker = WalkDir::new(asset_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_platform_debris(e));

    for entry in walker {
        let entry = entry.map_err(|e| ConvertError::Io(std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if seen.insert(name.clone()) {
            media.push(entry.into_path());
        } else {
            log::warn!(
                "Skipping {:?}: another media file is already named {}",
                entry.path(),
                name
            );
        }
    }

    Ok(media)
}

/// One note per record, in record order
pub fn build_deck(records: &[Record], deck_name: &str, config: &ConverterConfig) -> Result<Deck> {
    let model = Arc::new(Model::question_answer(&config.model));
    let mut deck = Deck::new(config.deck.id, deck_name);

    for record in records {
        let fields = vec![
            record.get(&config.columns.question).to_text(),
            record.get(&config.columns.answer).to_text(),
        ];
        deck.add_note(Note::new(&model, fields)?);
    }

    Ok(deck)
}

/// Build the deck, gather media and serialize the package into `out_dir`.
///
/// `fallback_deck_name` is used when stripping the extension from
/// `output_name` leaves nothing.
pub fn build_package(
    records: &[Record],
    asset_dir: Option<&Path>,
    output_name: &str,
    fallback_deck_name: &str,
    config: &ConverterConfig,
    out_dir: &Path,
) -> Result<BuiltPackage> {
    let mut name = deck_name(output_name, config);
    if name.trim().is_empty() {
        name = fallback_deck_name.to_string();
    }

    let deck = build_deck(records, &name, config)?;

    let media = match asset_dir {
        Some(dir) => collect_media(dir)?,
        None => Vec::new(),
    };
    let media_files: Vec<String> = media
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();

    let file_name = package_file_name(output_name, config);
    let path = out_dir.join(disk_file_name(&file_name, config));

    let note_count = deck.notes().len();
    log::info!(
        "Writing deck '{}' with {} note(s) and {} media file(s)",
        name,
        note_count,
        media.len()
    );

    Package::new(vec![deck], media).write_to_file(&path)?;

    Ok(BuiltPackage {
        path,
        file_name,
        deck_name: name,
        note_count,
        media_files,
    })
}
