//! Regression pipeline: preprocessor + boosted regressor.
//!
//! `predict` always transforms first and regresses second; callers only ever
//! see raw features going in and prices coming out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BoosterParams, PropertyFeatures, PropertyRecord, TrainingMetrics};
use crate::error::OracleError;
use crate::math::{mean_absolute_error, r_squared};
use crate::models::booster::GradientBoostedRegressor;
use crate::models::preprocess::FittedPreprocessor;

/// Entire fitted state: preprocessing statistics, vocabulary and ensemble.
///
/// Immutable once built; safe to share across threads for concurrent reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct FittedPipeline {
    preprocessor: FittedPreprocessor,
    regressor: GradientBoostedRegressor,
}

impl FittedPipeline {
    pub fn predict(&self, rows: &[PropertyFeatures]) -> Result<Vec<f64>, OracleError> {
        let features = self.preprocessor.transform(rows)?;
        self.regressor.predict(&features)
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    pub fn params(&self) -> BoosterParams {
        self.regressor.params()
    }

    /// Encode the fitted state as an opaque JSON blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, OracleError> {
        serde_json::to_vec(self)
            .map_err(|e| OracleError::Artifact(format!("failed to encode pipeline: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OracleError> {
        let pipeline: FittedPipeline = serde_json::from_slice(bytes)
            .map_err(|e| OracleError::Artifact(format!("failed to decode pipeline: {e}")))?;
        pipeline.check_consistency()?;
        Ok(pipeline)
    }

    /// Verify that the decoded parts fit together.
    pub fn check_consistency(&self) -> Result<(), OracleError> {
        if self.preprocessor.width() != self.regressor.n_features() {
            return Err(OracleError::Artifact(format!(
                "preprocessor emits {} columns but the regressor expects {}",
                self.preprocessor.width(),
                self.regressor.n_features()
            )));
        }
        Ok(())
    }
}

/// The trainable pipeline.
#[derive(Debug)]
pub struct RegressionPipeline {
    params: BoosterParams,
    fitted: Option<FittedPipeline>,
}

impl RegressionPipeline {
    pub fn new(params: BoosterParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn from_fitted(fitted: FittedPipeline) -> Self {
        Self {
            params: fitted.params(),
            fitted: Some(fitted),
        }
    }

    pub fn fitted(&self) -> Result<&FittedPipeline, OracleError> {
        self.fitted.as_ref().ok_or(OracleError::NotFitted)
    }

    pub fn into_fitted(self) -> Result<FittedPipeline, OracleError> {
        self.fitted.ok_or(OracleError::NotFitted)
    }

    /// Fit the preprocessor on the feature columns, then the regressor on
    /// `(transformed features, price)` pairs. Replaces any previous fit.
    pub fn fit(&mut self, records: &[PropertyRecord]) -> Result<(), OracleError> {
        let rows: Vec<PropertyFeatures> = records.iter().map(|r| r.features.clone()).collect();
        let labels: Vec<f64> = records.iter().map(|r| r.price_uf).collect();
        if labels.iter().any(|y| !y.is_finite()) {
            return Err(OracleError::InvalidDataset("non-finite price label".into()));
        }

        let preprocessor = FittedPreprocessor::fit(&rows)?;
        let features = preprocessor.transform(&rows)?;
        debug!(
            rows = features.len(),
            width = preprocessor.width(),
            "Fitting boosted regressor"
        );
        let regressor = GradientBoostedRegressor::fit(&features, &labels, self.params)?;

        self.fitted = Some(FittedPipeline {
            preprocessor,
            regressor,
        });
        Ok(())
    }

    pub fn predict(&self, rows: &[PropertyFeatures]) -> Result<Vec<f64>, OracleError> {
        self.fitted()?.predict(rows)
    }

    /// R² and MAE of predictions against true labels.
    pub fn evaluate(
        &self,
        rows: &[PropertyFeatures],
        labels: &[f64],
    ) -> Result<TrainingMetrics, OracleError> {
        let fitted = self.fitted()?;
        if rows.is_empty() {
            return Err(OracleError::InvalidDataset("evaluation set is empty".into()));
        }
        if rows.len() != labels.len() {
            return Err(OracleError::InvalidDataset(format!(
                "evaluation rows ({}) and labels ({}) differ in length",
                rows.len(),
                labels.len()
            )));
        }

        let predicted = fitted.predict(rows)?;
        let r_squared = r_squared(labels, &predicted)
            .ok_or_else(|| OracleError::Model("R² undefined for evaluation set".into()))?;
        let mean_absolute_error = mean_absolute_error(labels, &predicted)
            .ok_or_else(|| OracleError::Model("MAE undefined for evaluation set".into()))?;

        Ok(TrainingMetrics {
            r_squared,
            mean_absolute_error,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, OracleError> {
        self.fitted()?.to_bytes()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, OracleError> {
        FittedPipeline::from_bytes(bytes).map(Self::from_fitted)
    }
}
