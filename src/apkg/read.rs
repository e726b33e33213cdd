//! Reading a package back, for inspection and verification

use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use zip::ZipArchive;

use super::collection::DEFAULT_DECK_ID;
use super::models::FIELD_SEPARATOR;
use super::package::{PackageError, Result, COLLECTION_ENTRY, MEDIA_ENTRY};

/// What a package contains
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    /// Deck names, excluding Anki's built-in Default deck
    pub deck_names: Vec<String>,
    pub model_names: Vec<String>,
    /// Notes in id order, which is the order they were added
    pub notes: Vec<NoteSummary>,
    pub card_count: usize,
    /// Media file names in entry order
    pub media: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteSummary {
    pub guid: String,
    pub fields: Vec<String>,
}

/// Read a package file
pub fn read_package(path: &Path) -> Result<PackageSummary> {
    let bytes = fs::read(path)?;
    read_package_bytes(&bytes)
}

/// Read a package held in memory
pub fn read_package_bytes(bytes: &[u8]) -> Result<PackageSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let db_file = tempfile::Builder::new()
        .prefix("collection-")
        .suffix(".anki2")
        .tempfile()?;
    {
        let mut entry = archive.by_name(COLLECTION_ENTRY).map_err(|_| {
            PackageError::InvalidPackage(format!("{} not found", COLLECTION_ENTRY))
        })?;
        let mut out = fs::File::create(db_file.path())?;
        io::copy(&mut entry, &mut out)?;
    }

    let media = match archive.by_name(MEDIA_ENTRY) {
        Ok(mut entry) => {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            let map: HashMap<String, String> = serde_json::from_str(&content)?;
            let mut entries: Vec<(usize, String)> = map
                .into_iter()
                .filter_map(|(k, v)| k.parse::<usize>().ok().map(|idx| (idx, v)))
                .collect();
            entries.sort_by_key(|(idx, _)| *idx);
            entries.into_iter().map(|(_, name)| name).collect()
        }
        Err(_) => Vec::new(),
    };

    let conn = Connection::open_with_flags(db_file.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let (models, decks): (String, String) =
        conn.query_row("SELECT models, decks FROM col", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;

    let models: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&models)?;
    let model_names = models
        .values()
        .filter_map(|m| m["name"].as_str().map(|s| s.to_string()))
        .collect();

    let decks: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&decks)?;
    let deck_names = decks
        .iter()
        .filter(|(id, _)| id.as_str() != DEFAULT_DECK_ID.to_string())
        .filter_map(|(_, d)| d["name"].as_str().map(|s| s.to_string()))
        .collect();

    let mut stmt = conn.prepare("SELECT guid, flds FROM notes ORDER BY id")?;
    let notes = stmt
        .query_map([], |row| {
            let guid: String = row.get(0)?;
            let flds: String = row.get(1)?;
            Ok(NoteSummary {
                guid,
                fields: flds.split(FIELD_SEPARATOR).map(|s| s.to_string()).collect(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let card_count: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;

    Ok(PackageSummary {
        deck_names,
        model_names,
        notes,
        card_count: card_count as usize,
        media,
    })
}
