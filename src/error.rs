//! Error types.
//!
//! - `OracleError` is the library-level taxonomy returned by training, IO and
//!   the regression pipeline.
//! - `AppError` is what the binary prints; it carries the process exit code.
//!
//! Prediction requests do not use either type for control flow; see
//! `serve::PredictionOutcome`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// `predict`/`evaluate` called before `fit`.
    #[error("pipeline is not fitted; call fit() before predict() or evaluate()")]
    NotFitted,

    /// Training invoked without its input dataset.
    #[error("dataset not found at '{}'", .0.display())]
    DataSourceMissing(PathBuf),

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("artifact schema version {found} is not supported (expected {expected})")]
    UnsupportedArtifact { found: u32, expected: u32 },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("held-out R² {r_squared:.4} is below the required minimum {min_r_squared:.4}; artifact not written")]
    QualityGate { r_squared: f64, min_r_squared: f64 },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl OracleError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            OracleError::InvalidInput(_) | OracleError::Io { .. } => 2,
            OracleError::DataSourceMissing(_) | OracleError::InvalidDataset(_) => 3,
            OracleError::NotFitted | OracleError::Model(_) => 4,
            OracleError::UnsupportedArtifact { .. } | OracleError::Artifact(_) => 5,
            OracleError::QualityGate { .. } => 6,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<OracleError> for AppError {
    fn from(err: OracleError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
