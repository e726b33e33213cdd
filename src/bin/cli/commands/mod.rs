pub mod convert;
pub mod preview;
pub mod serve;
pub mod show;
