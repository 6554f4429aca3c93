//! Serving: the loaded model and the prediction contract.
//!
//! A `ServingContext` is built once at startup, is either ready or unavailable
//! for the rest of the process, and is shared read-only by every request.

pub mod context;
pub mod outcome;

pub use context::*;
pub use outcome::*;
