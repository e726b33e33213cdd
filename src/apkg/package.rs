//! Writing `.apkg` packages
//!
//! A package is a ZIP holding `collection.anki2` (SQLite), a `media` JSON
//! object mapping entry names to file names, and the media files themselves
//! stored under their numeric index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::collection::{
    collection_config, deck_options_json, decks_json, models_json, SCHEMA, SCHEMA_VERSION,
};
use super::models::Deck;

/// Name of the SQLite collection inside the package
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Name of the media map inside the package
pub const MEDIA_ENTRY: &str = "media";

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Note has {actual} field(s) but model '{model}' expects {expected}")]
    FieldCount {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("Media file not found: {}", .0.display())]
    MissingMedia(PathBuf),

    #[error("Invalid package: {0}")]
    InvalidPackage(String),
}

pub type Result<T> = std::result::Result<T, PackageError>;

/// Decks plus the media files they reference
pub struct Package {
    decks: Vec<Deck>,
    media_files: Vec<PathBuf>,
}

impl Package {
    pub fn new(decks: Vec<Deck>, media_files: Vec<PathBuf>) -> Self {
        Self { decks, media_files }
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn media_files(&self) -> &[PathBuf] {
        &self.media_files
    }

    /// Serialize the package to `path`, stamped with the current time
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        self.write_to_file_at(path, Utc::now())
    }

    /// Serialize the package to `path` with a fixed timestamp.
    ///
    /// Note and card ids are consecutive milliseconds starting at the
    /// timestamp, so notes keep the order they were added in.
    pub fn write_to_file_at(&self, path: &Path, timestamp: DateTime<Utc>) -> Result<()> {
        for media in &self.media_files {
            if !media.is_file() {
                return Err(PackageError::MissingMedia(media.clone()));
            }
        }

        // Staged beside the package
        let staging_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let db_file = tempfile::Builder::new()
            .prefix("collection-")
            .suffix(".anki2")
            .tempfile_in(staging_dir)?;
        {
            let mut conn = Connection::open(db_file.path())?;
            self.write_collection(&mut conn, timestamp)?;
            conn.close().map_err(|(_, e)| PackageError::Sqlite(e))?;
        }

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(COLLECTION_ENTRY, options)?;
        io::copy(&mut File::open(db_file.path())?, &mut zip)?;

        let mut media_map = BTreeMap::new();
        for (idx, media) in self.media_files.iter().enumerate() {
            let name = media
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| PackageError::MissingMedia(media.clone()))?;

            zip.start_file(idx.to_string(), options)?;
            io::copy(&mut File::open(media)?, &mut zip)?;
            media_map.insert(idx.to_string(), name);
        }

        zip.start_file(MEDIA_ENTRY, options)?;
        zip.write_all(serde_json::to_string(&media_map)?.as_bytes())?;

        zip.finish()?;

        log::debug!(
            "Wrote package {:?} ({} deck(s), {} media file(s))",
            path,
            self.decks.len(),
            self.media_files.len()
        );

        Ok(())
    }

    fn write_collection(&self, conn: &mut Connection, timestamp: DateTime<Utc>) -> Result<()> {
        conn.execute_batch(SCHEMA)?;

        let millis = timestamp.timestamp_millis();
        let seconds = timestamp.timestamp();
        let current_model = self
            .decks
            .iter()
            .flat_map(|d| d.models())
            .map(|m| m.id)
            .next()
            .unwrap_or_default();

        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO col VALUES (NULL, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, '{}')",
            params![
                seconds - seconds.rem_euclid(86_400),
                millis,
                millis,
                SCHEMA_VERSION,
                collection_config(current_model).to_string(),
                models_json(&self.decks, seconds).to_string(),
                decks_json(&self.decks, seconds).to_string(),
                deck_options_json().to_string(),
            ],
        )?;

        let mut next_id = millis;
        for deck in &self.decks {
            for note in deck.notes() {
                let note_id = next_id;
                next_id += 1;

                tx.execute(
                    "INSERT INTO notes VALUES (?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, 0, 0, '')",
                    params![
                        note_id,
                        note.guid(),
                        note.model().id,
                        seconds,
                        note.joined_tags(),
                        note.joined_fields(),
                        note.sort_field(),
                    ],
                )?;

                for ord in note.card_ords() {
                    let card_id = next_id;
                    next_id += 1;

                    tx.execute(
                        "INSERT INTO cards VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, '')",
                        params![card_id, note_id, deck.id, ord as i64, seconds],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}
