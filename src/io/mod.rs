//! Input/output helpers.
//!
//! - dataset CSV ingest + write (`ingest`)
//! - model artifact read/write (`artifact`)
//! - held-out prediction export (`export`)

pub mod artifact;
pub mod export;
pub mod ingest;

pub use artifact::*;
pub use export::*;
pub use ingest::*;
