//! Terminal output.
//!
//! Formatting lives here so the training and serving code only deal in
//! structured values.

pub mod format;

pub use format::*;
