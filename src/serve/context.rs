//! Serving context and the prediction contract.
//!
//! State machine:
//!
//! ```text
//! UNAVAILABLE --(artifact found + decoded at startup)--> READY
//! ```
//!
//! There is no transition back (short of process exit) and no reload: a new
//! artifact is picked up by restarting the process.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tracing::{error, info, warn};

use crate::domain::{ConfidenceBand, CurrencyUnit, HealthStatus, PredictionResult, PropertyFeatures};
use crate::error::OracleError;
use crate::io::{ModelArtifact, read_artifact};
use crate::models::FittedPipeline;
use crate::serve::outcome::{FailureReason, PredictionOutcome};

/// Served prices are quoted to the cent (two decimals).
pub const CENTS_PER_UF: i64 = 100;

/// A deserialized artifact ready to answer requests.
#[derive(Debug)]
pub struct LoadedModel {
    pipeline: FittedPipeline,
    confidence: ConfidenceBand,
}

impl LoadedModel {
    /// Point estimate plus the band, computed in whole cents.
    ///
    /// Working in integer cents makes `upper - lower` exactly `2E` at cent
    /// resolution; the `f64` values returned carry only the usual
    /// representation error of a two-decimal number.
    fn estimate(&self, features: &PropertyFeatures) -> Result<PredictionResult, OracleError> {
        let raw = self
            .pipeline
            .predict(std::slice::from_ref(features))?
            .first()
            .copied()
            .ok_or_else(|| OracleError::Model("pipeline returned no prediction".into()))?;

        let estimate = to_cents(raw)?;
        let half_width = to_cents(self.confidence.half_width)?;
        Ok(PredictionResult {
            estimate: from_cents(estimate),
            lower_bound: from_cents(estimate - half_width),
            upper_bound: from_cents(estimate + half_width),
            unit: CurrencyUnit::Uf,
        })
    }
}

/// Largest magnitude, in UF, that still converts to cents without overflow.
const MAX_PRICE_UF: f64 = 1.0e12;

fn to_cents(value: f64) -> Result<i64, OracleError> {
    if !(value.is_finite() && value.abs() < MAX_PRICE_UF) {
        return Err(OracleError::Model(format!("price {value} is out of range")));
    }
    Ok((value * CENTS_PER_UF as f64).round() as i64)
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / CENTS_PER_UF as f64
}

#[derive(Debug)]
pub enum ServingState {
    Unavailable,
    Ready(LoadedModel),
}

/// The one model a serving process holds. Immutable after construction, so
/// `&ServingContext` can be shared across request threads without locking.
#[derive(Debug)]
pub struct ServingContext {
    state: ServingState,
}

impl ServingContext {
    pub fn unavailable() -> Self {
        Self {
            state: ServingState::Unavailable,
        }
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self {
            state: ServingState::Ready(LoadedModel {
                pipeline: artifact.pipeline,
                confidence: artifact.confidence,
            }),
        }
    }

    /// Startup load.
    ///
    /// - no file at `path`: unavailable for the lifetime of the process
    /// - a file that cannot be decoded or has another schema version: error
    pub fn load(path: &Path) -> Result<Self, OracleError> {
        if !path.exists() {
            warn!(path = %path.display(), "Model artifact not found; serving unavailable");
            return Ok(Self::unavailable());
        }

        info!(path = %path.display(), "Loading model artifact");
        let artifact = read_artifact(path)?;
        info!(
            trained_at = %artifact.trained_at,
            r_squared = artifact.metrics.r_squared,
            half_width = artifact.confidence.half_width,
            "Model ready"
        );
        Ok(Self::from_artifact(artifact))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServingState::Ready(_))
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            model_loaded: self.is_ready(),
        }
    }

    /// Price one apartment.
    ///
    /// Never panics or returns an error: failures are logged with full detail
    /// and surface as an opaque `Failed`, leaving the context usable.
    pub fn predict(&self, features: &PropertyFeatures) -> PredictionOutcome {
        let ServingState::Ready(model) = &self.state else {
            return PredictionOutcome::Unavailable;
        };

        match catch_unwind(AssertUnwindSafe(|| model.estimate(features))) {
            Ok(Ok(result)) => PredictionOutcome::Ready(result),
            Ok(Err(e)) => {
                error!(error = %e, district = %features.district, "Prediction failed");
                PredictionOutcome::Failed(FailureReason::internal())
            }
            Err(_) => {
                error!(district = %features.district, "Prediction panicked");
                PredictionOutcome::Failed(FailureReason::internal())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoosterParams, PropertyRecord, TrainingMetrics};
    use crate::math::round_to;
    use crate::models::RegressionPipeline;

    fn cents(value: f64) -> i64 {
        (value * 100.0).round() as i64
    }

    fn ready_context(mae: f64) -> ServingContext {
        let records: Vec<PropertyRecord> = (0..60)
            .map(|i| PropertyRecord {
                features: PropertyFeatures::new(
                    ["Macul", "Providencia", "Vitacura"][i % 3],
                    30.0 + i as f64,
                    50.0 + 20.0 * i as f64,
                ),
                price_uf: 8.0 + 0.25 * i as f64,
            })
            .collect();
        let mut pipeline = RegressionPipeline::new(BoosterParams {
            n_estimators: 20,
            ..BoosterParams::default()
        });
        pipeline.fit(&records).unwrap();
        let metrics = TrainingMetrics {
            r_squared: 0.9,
            mean_absolute_error: mae,
        };
        ServingContext::from_artifact(ModelArtifact::new(pipeline.into_fitted().unwrap(), metrics))
    }

    #[test]
    fn unavailable_context_rejects_every_request() {
        let ctx = ServingContext::unavailable();
        assert!(!ctx.is_ready());
        assert!(!ctx.health().model_loaded);
        let outcome = ctx.predict(&PropertyFeatures::new("Macul", 50.0, 100.0));
        assert_eq!(outcome, PredictionOutcome::Unavailable);
    }

    #[test]
    fn missing_artifact_loads_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServingContext::load(&dir.path().join("absent.json")).unwrap();
        assert!(!ctx.is_ready());
    }

    #[test]
    fn corrupt_artifact_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{}").unwrap();
        assert!(ServingContext::load(&path).is_err());
    }

    #[test]
    fn band_is_symmetric_around_rounded_estimate() {
        let ctx = ready_context(2.2149);
        assert!(ctx.health().model_loaded);

        let PredictionOutcome::Ready(result) = ctx.predict(&PropertyFeatures::new("Providencia", 55.0, 350.0)) else {
            panic!("expected a ready prediction");
        };
        assert_eq!(result.estimate, round_to(result.estimate, 2));
        assert!(result.lower_bound < result.estimate && result.estimate < result.upper_bound);
        assert_eq!(cents(result.upper_bound) - cents(result.lower_bound), 2 * 221);
        assert_eq!(cents(result.estimate) - cents(result.lower_bound), 221);
        assert_eq!(result.unit, CurrencyUnit::Uf);
    }

    #[test]
    fn malformed_row_fails_without_poisoning_the_context() {
        let ctx = ready_context(1.0);
        let outcome = ctx.predict(&PropertyFeatures::new("Macul", f64::NAN, 100.0));
        assert_eq!(outcome, PredictionOutcome::Failed(FailureReason::internal()));

        let next = ctx.predict(&PropertyFeatures::new("Macul", 50.0, 100.0));
        assert!(next.is_ready());
    }

    #[test]
    fn band_width_is_exactly_two_e_in_cents_for_every_input() {
        let ctx = ready_context(1.0749);
        for surface in [20.0, 47.0, 83.0, 131.0, 290.0] {
            for distance in [1.0, 333.0, 1750.0, 4200.0] {
                let PredictionOutcome::Ready(result) = ctx.predict(&PropertyFeatures::new("Vitacura", surface, distance))
                else {
                    panic!("expected a ready prediction");
                };
                assert_eq!(cents(result.upper_bound) - cents(result.lower_bound), 2 * 107);
                assert_eq!(result.lower_bound, round_to(result.lower_bound, 2));
                assert_eq!(result.upper_bound, round_to(result.upper_bound, 2));
            }
        }
    }

    #[test]
    fn out_of_range_prices_are_rejected_in_cents() {
        assert!(to_cents(f64::INFINITY).is_err());
        assert!(to_cents(2.0e12).is_err());
        assert_eq!(to_cents(12.34).unwrap(), 1234);
        assert_eq!(from_cents(-107), -1.07);
    }
}
