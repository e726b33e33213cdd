use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use deckpress_lib::config::ConverterConfig;

/// Shared state for CLI commands
pub struct App {
    pub config: ConverterConfig,
}

impl App {
    /// Load the configuration file, or the defaults when none is given
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = ConverterConfig::load(config_path).with_context(|| match config_path {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Invalid default configuration".to_string(),
        })?;

        Ok(Self { config })
    }

    /// Read an archive from disk
    pub fn read_archive(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.is_file() {
            bail!("Archive not found: {}", path.display());
        }
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
