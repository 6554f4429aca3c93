//! Upstream data sources.
//!
//! - `market`: calibrated rental-market simulator producing labelled rows

pub mod market;

pub use market::*;
