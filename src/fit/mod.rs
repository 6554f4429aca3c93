//! Training orchestration.
//!
//! Responsibilities:
//!
//! - split the dataset into training and held-out partitions (seeded)
//! - fit the regression pipeline on the training partition only
//! - evaluate on the held-out partition (plus a linear baseline for comparison)
//! - persist the artifact, unless an opt-in quality gate rejects the run

pub mod split;
pub mod trainer;

pub use split::*;
pub use trainer::*;
