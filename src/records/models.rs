use std::fmt;

use serde::Serialize;

/// A cell as read from the data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Text(String),
    /// The row ended before this column
    Missing,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Missing => None,
        }
    }

    /// Text form used for note fields; a missing cell becomes empty text
    pub fn to_text(&self) -> String {
        self.as_text().unwrap_or_default().to_string()
    }

    /// Apply `f` to textual values, pass everything else through
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            FieldValue::Text(text) => FieldValue::Text(f(&text)),
            FieldValue::Missing => FieldValue::Missing,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text().unwrap_or_default())
    }
}

static MISSING: FieldValue = FieldValue::Missing;

/// One data row with its values keyed by header name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// 1-based line in the source file
    pub line: u64,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(line: u64, fields: Vec<(String, FieldValue)>) -> Self {
        Self { line, fields }
    }

    /// Value of the first column named `column`, `Missing` if there is none
    pub fn get(&self, column: &str) -> &FieldValue {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .unwrap_or(&MISSING)
    }

    /// Replace the value of the first column named `column`
    pub fn update(&mut self, column: &str, f: impl FnOnce(FieldValue) -> FieldValue) {
        if let Some((_, value)) = self.fields.iter_mut().find(|(name, _)| name == column) {
            let current = std::mem::replace(value, FieldValue::Missing);
            *value = f(current);
        }
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }
}

/// A parsed data file
#[derive(Debug, Clone)]
pub struct DataTable {
    /// File name, for messages
    pub file_name: String,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl DataTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}
