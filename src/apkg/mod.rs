//! Anki package (`.apkg`) format
//!
//! Builds the container Anki imports:
//! - Note types with fields, card templates and styling
//! - Decks holding notes in insertion order
//! - A SQLite collection (schema 11) plus bundled media
//!
//! The calling pattern is deck, then notes, then package:
//! `Deck::new`, `Deck::add_note(Note::new(..)?)`, `Package::write_to_file`.

pub mod collection;
mod models;
mod package;
mod read;

pub use models::*;
pub use package::*;
pub use read::*;
