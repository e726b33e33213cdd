//! Reading the CSV file and rewriting image references

use std::fs;
use std::path::Path;

use crate::config::{ColumnConfig, ConverterConfig};
use crate::error::{ConvertError, Result};

use super::models::{DataTable, FieldValue, Record};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Read and parse the data file at `path`
pub fn read_table(path: &Path) -> Result<DataTable> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let content = decode_text(&bytes, &file_name);
    parse_table(&content, &file_name, delimiter_for(path))
}

/// Spreadsheet exports are usually UTF-8; older Excel versions write
/// Windows-1252, which is decoded instead of rejected.
fn decode_text(bytes: &[u8], file_name: &str) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            log::warn!("{} is not valid UTF-8, decoding as Windows-1252", file_name);
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };

    match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn delimiter_for(path: &Path) -> u8 {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

/// Parse delimited text whose first row names the columns
pub fn parse_table(content: &str, file_name: &str, delimiter: u8) -> Result<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = row
                    .get(idx)
                    .map(|cell| FieldValue::Text(cell.to_string()))
                    .unwrap_or(FieldValue::Missing);
                (header.clone(), value)
            })
            .collect();

        records.push(Record::new(line, fields));
    }

    log::debug!(
        "Parsed {} with {} column(s) and {} row(s)",
        file_name,
        headers.len(),
        records.len()
    );

    Ok(DataTable {
        file_name: file_name.to_string(),
        headers,
        records,
    })
}

/// Configured columns the table lacks, in question/answer order
pub fn missing_columns(table: &DataTable, columns: &ColumnConfig) -> Vec<String> {
    [&columns.question, &columns.answer]
        .into_iter()
        .filter(|column| !table.has_column(column))
        .cloned()
        .collect()
}

/// Require the question and answer columns (exact, case-sensitive names)
pub fn validate_columns(table: &DataTable, columns: &ColumnConfig) -> Result<()> {
    let missing = missing_columns(table, columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::SchemaMismatch {
            file: table.file_name.clone(),
            missing,
        })
    }
}

/// Point `src="<folder>/name"` attributes at the bare file name, which is
/// how media is addressed inside a package. Nothing else is touched.
pub fn rewrite_asset_refs(text: &str, asset_folder: &str) -> String {
    let nested = format!("src=\"{}/", asset_folder);
    text.replace(&nested, "src=\"")
}

/// Rewrite image references in the question and answer of every record
pub fn normalize_records(
    table: DataTable,
    columns: &ColumnConfig,
    asset_folder: &str,
) -> Vec<Record> {
    table
        .records
        .into_iter()
        .map(|mut record| {
            for column in [&columns.question, &columns.answer] {
                record.update(column, |value| {
                    value.map_text(|text| rewrite_asset_refs(text, asset_folder))
                });
            }
            record
        })
        .collect()
}

/// Read, validate and normalize the data file
pub fn load_records(path: &Path, config: &ConverterConfig) -> Result<Vec<Record>> {
    let table = read_table(path)?;
    validate_columns(&table, &config.columns)?;
    Ok(normalize_records(
        table,
        &config.columns,
        &config.archive.asset_folder,
    ))
}
