//! `property-oracle` library crate.
//!
//! The binary (`oracle`) is a thin wrapper around this library so that:
//!
//! - training and serving are testable without spawning processes
//! - a web front-end can embed `serve::ServingContext` directly
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod serve;
