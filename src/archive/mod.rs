//! Archive extraction
//!
//! Unpacks an uploaded ZIP into request scratch space and selects:
//! - the tabular data file (first `.csv` by path)
//! - the image folder (first directory named `images`, any case)

mod extract;

pub use extract::*;
