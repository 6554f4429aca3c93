//! Command-line parsing for the rental price estimator.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! training and serving. Path-like options can also come from the environment
//! (`ORACLE_DATA_PATH`, `ORACLE_MODEL_PATH`, optionally via a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::District;

pub const DEFAULT_DATA_PATH: &str = "data/raw/market_data.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/price_predictor_v1.json";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "oracle", version, about = "Santiago rental price estimator (gradient boosting, UF)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate a labelled market dataset and write it as CSV.
    Generate(GenerateArgs),
    /// Fit the pipeline on the dataset, evaluate on a held-out split and persist the artifact.
    Train(TrainArgs),
    /// Price one apartment (or a JSON-lines batch) with the persisted artifact.
    Predict(PredictArgs),
    /// Report whether a model artifact can be served.
    Health(ModelArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Number of simulated listings.
    #[arg(short = 'n', long, default_value_t = 5000)]
    pub samples: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Destination CSV.
    #[arg(short, long, env = "ORACLE_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Model artifact (JSON).
    #[arg(short, long, env = "ORACLE_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Training dataset (CSV with comuna, surface_m2, distance_to_metro, price_uf).
    #[arg(short, long, env = "ORACLE_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Seed for the train/held-out shuffle.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Number of boosting rounds.
    #[arg(long, default_value_t = 200)]
    pub trees: usize,

    #[arg(long, default_value_t = 3)]
    pub max_depth: u32,

    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 1)]
    pub min_leaf_size: usize,

    /// Refuse to write the artifact when held-out R² is below this value.
    #[arg(long = "min-r2")]
    pub min_r2: Option<f64>,

    /// Write held-out predictions and residuals to CSV.
    #[arg(long)]
    pub export_predictions: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, value_enum, required_unless_present_any = ["request", "batch"])]
    pub district: Option<District>,

    /// Usable surface in m².
    #[arg(long, requires = "district")]
    pub surface: Option<f64>,

    /// Walking distance to the nearest metro station in metres.
    #[arg(long, requires = "district")]
    pub distance: Option<f64>,

    /// A single JSON request body: {"comuna": ..., "surface_m2": ..., "distance_to_metro": ...}
    #[arg(long, conflicts_with_all = ["district", "batch"])]
    pub request: Option<String>,

    /// File with one JSON request body per line.
    #[arg(long, conflicts_with_all = ["district", "request"])]
    pub batch: Option<PathBuf>,

    /// Print JSON response bodies instead of text.
    #[arg(long)]
    pub json: bool,
}
