//! Convert zipped CSV flashcards, with their images, into Anki packages.

pub mod apkg;
pub mod archive;
pub mod config;
pub mod convert;
pub mod error;
pub mod records;
pub mod server;

pub use config::ConverterConfig;
pub use convert::{convert_archive, preview_archive, ArchivePreview, ConvertedPackage};
pub use error::{ConvertError, Result};
