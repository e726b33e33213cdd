use serde::{Deserialize, Serialize};

/// Default value of the output name field. Leaving it unchanged means
/// "name the package after the CSV file".
pub const DEFAULT_OUTPUT_NAME: &str = "diana-flashcards";

/// Model id Anki uses to recognize notes from earlier conversions.
pub const DEFAULT_MODEL_ID: i64 = 1607392319;

pub const DEFAULT_DECK_ID: i64 = 2059400110;

const DEFAULT_CARD_CSS: &str = r#"
.card {
  font-family: arial;
  font-size: 20px;
  text-align: center;
  color: black;
  background-color: white;
}
"#;

/// Everything a conversion needs to know besides the archive itself
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    pub columns: ColumnConfig,
    pub archive: ArchiveConfig,
    pub output: OutputConfig,
    pub deck: DeckConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
}

/// CSV header names that feed the two note fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnConfig {
    pub question: String,
    pub answer: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            question: "Question".to_string(),
            answer: "Answer".to_string(),
        }
    }
}

/// How the data file and the image folder are recognized inside the ZIP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Extension of the tabular file, without the dot
    pub data_extension: String,
    /// Folder name (case-insensitive) holding the images
    pub asset_folder: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_extension: "csv".to_string(),
            asset_folder: "images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub default_name: String,
    /// Extension of the produced package, without the dot
    pub package_extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_OUTPUT_NAME.to_string(),
            package_extension: "apkg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeckConfig {
    pub id: i64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self { id: DEFAULT_DECK_ID }
    }
}

/// The fixed two-field note type. Changing `id` makes Anki treat the
/// imported notes as a different note type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub id: i64,
    pub name: String,
    pub template_name: String,
    pub front_template: String,
    pub back_template: String,
    pub css: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL_ID,
            name: "Simple Model".to_string(),
            template_name: "Card 1".to_string(),
            front_template: "{{Question}}".to_string(),
            back_template: r#"{{Question}}<hr id="answer">{{Answer}}"#.to_string(),
            css: DEFAULT_CARD_CSS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}
