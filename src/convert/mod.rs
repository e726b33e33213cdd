//! CSV-to-package conversion
//!
//! Ties the pieces together for a single request:
//! - Extract the archive into request-local scratch space
//! - Read and normalize the question/answer records
//! - Build the deck and media set and serialize the package
//!
//! Also previews an archive without building anything.

pub mod builder;
pub mod naming;
mod pipeline;
mod preview;

pub use builder::{build_deck, build_package, collect_media, BuiltPackage};
pub use pipeline::*;
pub use preview::*;
