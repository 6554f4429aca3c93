//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed district set (`District`)
//! - raw and labelled property rows (`PropertyFeatures`, `PropertyRecord`)
//! - the request/response contract (`PropertyInput`, `PredictionResponse`)
//! - training outputs and run configuration (`TrainingMetrics`, `TrainConfig`, etc.)

pub mod types;

pub use types::*;
