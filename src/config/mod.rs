//! Converter configuration
//!
//! Column names, archive conventions, output naming and the fixed note type
//! are explicit, validated values instead of literals scattered through the
//! pipeline. All of it can be overridden from a TOML file.

mod models;

use std::fs;
use std::path::Path;

use thiserror::Error;

pub use models::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConverterConfig {
    /// Load configuration from a TOML file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ConverterConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        require_non_blank("columns.question", &self.columns.question)?;
        require_non_blank("columns.answer", &self.columns.answer)?;
        if self.columns.question == self.columns.answer {
            return Err(invalid(
                "columns.answer",
                "must differ from columns.question",
            ));
        }

        require_plain_name("archive.data_extension", &self.archive.data_extension)?;
        require_plain_name("archive.asset_folder", &self.archive.asset_folder)?;
        require_plain_name("output.package_extension", &self.output.package_extension)?;
        if self.archive.data_extension.starts_with('.') {
            return Err(invalid("archive.data_extension", "leave out the leading dot"));
        }
        if self.output.package_extension.starts_with('.') {
            return Err(invalid("output.package_extension", "leave out the leading dot"));
        }

        if self.deck.id <= 0 {
            return Err(invalid("deck.id", "must be positive"));
        }
        if self.model.id <= 0 {
            return Err(invalid("model.id", "must be positive"));
        }
        require_non_blank("model.name", &self.model.name)?;
        require_non_blank("model.front_template", &self.model.front_template)?;

        if self.server.max_upload_bytes == 0 {
            return Err(invalid("server.max_upload_bytes", "must be greater than zero"));
        }

        Ok(())
    }

    /// The `.ext` suffix of the tabular file
    pub fn data_suffix(&self) -> String {
        format!(".{}", self.archive.data_extension)
    }

    /// The `.ext` suffix of the produced package
    pub fn package_suffix(&self) -> String {
        format!(".{}", self.output.package_extension)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be blank"));
    }
    Ok(())
}

fn require_plain_name(field: &'static str, value: &str) -> Result<()> {
    require_non_blank(field, value)?;
    if value.contains('/') || value.contains('\\') {
        return Err(invalid(field, "must not contain path separators"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConverterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.columns.question, "Question");
        assert_eq!(config.model.id, 1607392319);
        assert_eq!(config.deck.id, 2059400110);
        assert_eq!(config.data_suffix(), ".csv");
        assert_eq!(config.package_suffix(), ".apkg");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConverterConfig::from_toml(
            r#"
[columns]
question = "Front"

[output]
default_name = "my-cards"
"#,
        )
        .unwrap();

        assert_eq!(config.columns.question, "Front");
        assert_eq!(config.columns.answer, "Answer");
        assert_eq!(config.output.default_name, "my-cards");
        assert_eq!(config.output.package_extension, "apkg");
        assert_eq!(config.archive.asset_folder, "images");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ConverterConfig::default();
        config.columns.answer = "Question".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "columns.answer", .. })
        ));

        let mut config = ConverterConfig::default();
        config.archive.asset_folder = "media/images".to_string();
        assert!(config.validate().is_err());

        let mut config = ConverterConfig::default();
        config.output.package_extension = ".apkg".to_string();
        assert!(config.validate().is_err());

        let mut config = ConverterConfig::default();
        config.model.id = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("deckpress.toml");
        fs::write(&path, "[deck]\nid = 42\n").unwrap();

        let config = ConverterConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.deck.id, 42);

        fs::write(&path, "[deck]\nid = -1\n").unwrap();
        assert!(ConverterConfig::load(Some(path.as_path())).is_err());
    }
}
