//! Regression models.
//!
//! - `preprocess`: frozen numeric scaling + one-hot district encoding
//! - `booster`: gradient-boosted regression trees (the served estimator)
//! - `linear`: least-squares baseline used for reporting only
//! - `pipeline`: preprocessor + booster composed behind fit/predict/evaluate

pub mod booster;
pub mod linear;
pub mod pipeline;
pub mod preprocess;

pub use booster::*;
pub use linear::*;
pub use pipeline::*;
pub use preprocess::*;
