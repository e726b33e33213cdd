//! Error taxonomy for a conversion request.

use thiserror::Error;

use crate::apkg::PackageError;
use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Please upload a ZIP file.")]
    MissingInput,

    #[error("No {} file found in the ZIP.", .extension.to_uppercase())]
    MissingDataFile { extension: String },

    #[error("{file} is missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch { file: String, missing: Vec<String> },

    #[error("Invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write package: {0}")]
    Package(#[from] PackageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Whether the requester can fix this by changing the upload.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingInput
                | ConvertError::MissingDataFile { .. }
                | ConvertError::SchemaMismatch { .. }
                | ConvertError::Zip(_)
                | ConvertError::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConvertError::MissingDataFile {
            extension: "csv".to_string(),
        };
        assert_eq!(err.to_string(), "No CSV file found in the ZIP.");

        let err = ConvertError::SchemaMismatch {
            file: "cards.csv".to_string(),
            missing: vec!["Question".to_string(), "Answer".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cards.csv is missing required column(s): Question, Answer"
        );
    }

    #[test]
    fn test_is_user_error() {
        assert!(ConvertError::MissingInput.is_user_error());
        assert!(!ConvertError::Io(std::io::Error::other("disk full")).is_user_error());
    }
}
