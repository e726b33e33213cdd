//! Record normalization
//!
//! Parses the data file into header-keyed records, checks that the
//! question and answer columns exist, and rewrites `src="images/..."`
//! references to bare file names.

mod models;
mod normalize;

pub use models::*;
pub use normalize::*;
