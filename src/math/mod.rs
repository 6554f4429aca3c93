//! Mathematical utilities: descriptive statistics, regression metrics and
//! least squares.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
