//! Gradient-boosted regression trees.
//!
//! Wraps the `gbdt` crate: squared-error loss, a fixed number of shallow trees
//! added in stages with shrinkage. Row/feature subsampling stays at 1.0 so a
//! fit is fully deterministic given its input.
//!
//! Note: the gbdt crate internally uses `f32` (`ValueType`), while the rest of
//! the pipeline works in `f64`. Conversions happen at this boundary only.

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::domain::BoosterParams;
use crate::error::OracleError;

#[inline]
fn row_to_f32(row: &[f64]) -> Vec<f32> {
    row.iter().map(|&v| v as f32).collect()
}

/// A fitted boosted ensemble.
#[derive(Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    params: BoosterParams,
    n_features: usize,
    model: GBDT,
}

impl GradientBoostedRegressor {
    /// Fit an ensemble on transformed feature rows.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[f64],
        params: BoosterParams,
    ) -> Result<Self, OracleError> {
        if features.is_empty() {
            return Err(OracleError::Model("no training samples provided".into()));
        }
        if features.len() != labels.len() {
            return Err(OracleError::Model(format!(
                "feature count ({}) does not match label count ({})",
                features.len(),
                labels.len()
            )));
        }
        if params.n_estimators == 0 || params.max_depth == 0 {
            return Err(OracleError::Model(
                "n_estimators and max_depth must be at least 1".into(),
            ));
        }
        if !(params.learning_rate.is_finite() && params.learning_rate > 0.0) {
            return Err(OracleError::Model(format!(
                "learning rate must be positive, got {}",
                params.learning_rate
            )));
        }

        let n_features = features[0].len();
        if let Some(bad) = features.iter().position(|f| f.len() != n_features) {
            return Err(OracleError::Model(format!(
                "row {bad} has {} features, expected {n_features}",
                features[bad].len()
            )));
        }

        let mut cfg = Config::new();
        cfg.set_feature_size(n_features);
        cfg.set_max_depth(params.max_depth);
        cfg.set_iterations(params.n_estimators);
        cfg.set_shrinkage(params.learning_rate as f32);
        cfg.set_loss("SquaredError");
        cfg.set_min_leaf_size(params.min_leaf_size.max(1));
        cfg.set_data_sample_ratio(1.0);
        cfg.set_feature_sample_ratio(1.0);
        cfg.set_training_optimization_level(2);
        cfg.set_debug(false);

        let mut model = GBDT::new(&cfg);

        let mut training_data: Vec<Data> = features
            .iter()
            .zip(labels)
            .map(|(f, &label)| Data::new_training_data(row_to_f32(f), 1.0_f32, label as f32, None))
            .collect();

        model.fit(&mut training_data);

        Ok(Self {
            params,
            n_features,
            model,
        })
    }

    /// Predict one value per transformed row.
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, OracleError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = features.iter().position(|f| f.len() != self.n_features) {
            return Err(OracleError::Model(format!(
                "row {bad} has {} features, model expects {}",
                features[bad].len(),
                self.n_features
            )));
        }

        let data: Vec<Data> = features
            .iter()
            .map(|f| Data::new_test_data(row_to_f32(f), None))
            .collect();

        let preds: Vec<f64> = self.model.predict(&data).into_iter().map(f64::from).collect();
        if preds.len() != features.len() {
            return Err(OracleError::Model(format!(
                "model returned {} predictions for {} rows",
                preds.len(),
                features.len()
            )));
        }
        if preds.iter().any(|p| !p.is_finite()) {
            return Err(OracleError::Model("non-finite model prediction".into()));
        }
        Ok(preds)
    }

    pub fn params(&self) -> BoosterParams {
        self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl std::fmt::Debug for GradientBoostedRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientBoostedRegressor")
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}
