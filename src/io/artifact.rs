//! Model artifact read/write.
//!
//! The artifact is the only hand-off between training and serving: one JSON
//! document holding
//!
//! - a schema version (checked before anything else is decoded)
//! - provenance (`tool`, `trained_at`)
//! - the held-out metrics and the confidence band derived from them
//! - the complete fitted pipeline
//!
//! Writes go to a temporary sibling file that is renamed into place, so a
//! reader never observes a half-written artifact.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConfidenceBand, TrainingMetrics};
use crate::error::OracleError;
use crate::models::FittedPipeline;

/// Bump whenever the feature set or encoding changes.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;
pub const ARTIFACT_TOOL: &str = "property-oracle";

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub tool: String,
    pub trained_at: DateTime<Utc>,
    pub metrics: TrainingMetrics,
    pub confidence: ConfidenceBand,
    pub pipeline: FittedPipeline,
}

#[derive(Deserialize)]
struct ArtifactHeader {
    schema_version: u32,
}

impl ModelArtifact {
    pub fn new(pipeline: FittedPipeline, metrics: TrainingMetrics) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            tool: ARTIFACT_TOOL.to_string(),
            trained_at: Utc::now(),
            metrics,
            confidence: ConfidenceBand::from_mae(metrics.mean_absolute_error),
            pipeline,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, OracleError> {
        serde_json::to_vec(self).map_err(|e| OracleError::Artifact(format!("failed to encode artifact: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OracleError> {
        let header: ArtifactHeader = serde_json::from_slice(bytes)
            .map_err(|e| OracleError::Artifact(format!("not a model artifact: {e}")))?;
        if header.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(OracleError::UnsupportedArtifact {
                found: header.schema_version,
                expected: ARTIFACT_SCHEMA_VERSION,
            });
        }

        let artifact: ModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| OracleError::Artifact(format!("invalid artifact: {e}")))?;

        artifact.pipeline.check_consistency()?;

        if !(artifact.confidence.half_width.is_finite() && artifact.confidence.half_width > 0.0) {
            return Err(OracleError::Artifact(format!(
                "confidence half-width must be positive, got {}",
                artifact.confidence.half_width
            )));
        }
        Ok(artifact)
    }
}

/// Atomically write an artifact, creating parent directories.
pub fn write_artifact(path: &Path, artifact: &ModelArtifact) -> Result<(), OracleError> {
    let bytes = artifact.to_bytes()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| OracleError::io(format!("failed to create '{}'", parent.display()), e))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, &bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(OracleError::io(format!("failed to write '{}'", tmp.display()), e));
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        OracleError::io(format!("failed to move artifact into '{}'", path.display()), e)
    })
}

/// Read and validate an artifact.
pub fn read_artifact(path: &Path) -> Result<ModelArtifact, OracleError> {
    let bytes = fs::read(path)
        .map_err(|e| OracleError::io(format!("failed to read artifact '{}'", path.display()), e))?;
    ModelArtifact::from_bytes(&bytes)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoosterParams, PropertyFeatures, PropertyRecord};
    use crate::models::RegressionPipeline;

    fn fitted() -> FittedPipeline {
        let records: Vec<PropertyRecord> = (0..40)
            .map(|i| PropertyRecord {
                features: PropertyFeatures::new(
                    if i % 2 == 0 { "Macul" } else { "Providencia" },
                    30.0 + i as f64,
                    100.0 + 10.0 * i as f64,
                ),
                price_uf: 5.0 + 0.2 * i as f64,
            })
            .collect();
        let mut pipeline = RegressionPipeline::new(BoosterParams {
            n_estimators: 10,
            ..BoosterParams::default()
        });
        pipeline.fit(&records).unwrap();
        pipeline.into_fitted().unwrap()
    }

    fn metrics() -> TrainingMetrics {
        TrainingMetrics {
            r_squared: 0.93,
            mean_absolute_error: 1.234,
        }
    }

    #[test]
    fn write_then_read_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/model.json");

        let artifact = ModelArtifact::new(fitted(), metrics());
        write_artifact(&path, &artifact).unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = read_artifact(&path).unwrap();
        assert_eq!(loaded.schema_version, ARTIFACT_SCHEMA_VERSION);
        assert_eq!(loaded.tool, ARTIFACT_TOOL);
        assert_eq!(loaded.metrics, metrics());
        assert_eq!(loaded.confidence.half_width, 1.23);
        assert_eq!(loaded.trained_at, artifact.trained_at);
    }

    #[test]
    fn unknown_schema_version_fails_fast() {
        let artifact = ModelArtifact::new(fitted(), metrics());
        let mut doc: serde_json::Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
        doc["schema_version"] = serde_json::json!(2);
        let bytes = serde_json::to_vec(&doc).unwrap();

        let err = ModelArtifact::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, OracleError::UnsupportedArtifact { found: 2, expected: 1 }));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            ModelArtifact::from_bytes(b"not json"),
            Err(OracleError::Artifact(_))
        ));
        assert!(matches!(
            ModelArtifact::from_bytes(br#"{"schema_version": 1}"#),
            Err(OracleError::Artifact(_))
        ));
    }
}
