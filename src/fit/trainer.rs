//! One offline training run: dataset file in, artifact file out.
//!
//! Workflow:
//! dataset -> seeded split -> fit (train partition) -> evaluate (held-out) -> gate -> persist
//!
//! Nothing is written to the artifact location until every earlier step has
//! succeeded, and the write itself is atomic.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::domain::{BoosterParams, ConfidenceBand, PropertyFeatures, PropertyRecord, TrainConfig, TrainingMetrics};
use crate::error::OracleError;
use crate::fit::split::train_test_split;
use crate::io::{ModelArtifact, load_dataset, write_artifact, write_predictions_csv};
use crate::math::{mean_absolute_error, r_squared};
use crate::models::{LinearBaseline, RegressionPipeline};

/// In-memory result of fitting + evaluating on one split.
#[derive(Debug)]
pub struct TrainedModel {
    pub pipeline: RegressionPipeline,
    pub metrics: TrainingMetrics,
    /// Linear least-squares baseline on the same split (for comparison only).
    pub baseline: Option<TrainingMetrics>,
    pub n_train: usize,
    pub held_out: Vec<PropertyRecord>,
    pub held_out_predictions: Vec<f64>,
}

/// Summary of a completed, persisted training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub metrics: TrainingMetrics,
    pub baseline: Option<TrainingMetrics>,
    pub confidence: ConfidenceBand,
    pub params: BoosterParams,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub model_path: PathBuf,
}

/// Execute a full training run and persist the artifact.
pub fn run_training(config: &TrainConfig) -> Result<TrainingRun, OracleError> {
    if let Some(min) = config.min_r_squared {
        if !min.is_finite() {
            return Err(OracleError::InvalidInput(format!("minimum R² must be finite, got {min}")));
        }
    }

    info!(path = %config.data_path.display(), "Loading training data");
    let data = load_dataset(&config.data_path)?;

    let trained = train_on_records(&data.records, config)?;
    let metrics = trained.metrics;
    info!(
        r_squared = metrics.r_squared,
        mae = metrics.mean_absolute_error,
        "Training completed"
    );

    if let Some(min_r_squared) = config.min_r_squared {
        if metrics.r_squared < min_r_squared {
            warn!(
                r_squared = metrics.r_squared,
                min_r_squared, "Quality gate rejected the run; existing artifact left untouched"
            );
            return Err(OracleError::QualityGate {
                r_squared: metrics.r_squared,
                min_r_squared,
            });
        }
    }

    if let Some(path) = &config.export_predictions {
        write_predictions_csv(path, &trained.held_out, &trained.held_out_predictions)?;
        info!(path = %path.display(), "Exported held-out predictions");
    }

    let n_test = trained.held_out.len();
    let fitted = trained.pipeline.into_fitted()?;
    let params = fitted.params();
    let artifact = ModelArtifact::new(fitted, metrics);
    let confidence = artifact.confidence;
    write_artifact(&config.model_path, &artifact)?;
    info!(
        path = %config.model_path.display(),
        half_width = confidence.half_width,
        "Artifact serialized"
    );

    Ok(TrainingRun {
        metrics,
        baseline: trained.baseline,
        confidence,
        params,
        rows_read: data.rows_read,
        rows_skipped: data.row_errors.len(),
        n_train: trained.n_train,
        n_test,
        model_path: config.model_path.clone(),
    })
}

/// Split, fit on the training partition and evaluate on the held-out one.
pub fn train_on_records(records: &[PropertyRecord], config: &TrainConfig) -> Result<TrainedModel, OracleError> {
    let split = train_test_split(records, config.test_fraction, config.seed)?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        seed = config.seed,
        "Split dataset"
    );

    let mut pipeline = RegressionPipeline::new(config.booster);
    info!(
        n_estimators = config.booster.n_estimators,
        max_depth = config.booster.max_depth,
        learning_rate = config.booster.learning_rate,
        "Fitting gradient-boosted pipeline"
    );
    pipeline.fit(&split.train)?;

    let test_rows: Vec<PropertyFeatures> = split.test.iter().map(|r| r.features.clone()).collect();
    let test_labels: Vec<f64> = split.test.iter().map(|r| r.price_uf).collect();
    let metrics = pipeline.evaluate(&test_rows, &test_labels)?;
    let held_out_predictions = pipeline.predict(&test_rows)?;

    let baseline = match fit_linear_baseline(&pipeline, &split.train, &test_rows, &test_labels) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = %e, "Linear baseline unavailable");
            None
        }
    };

    Ok(TrainedModel {
        pipeline,
        metrics,
        baseline,
        n_train: split.train.len(),
        held_out: split.test,
        held_out_predictions,
    })
}

fn fit_linear_baseline(
    pipeline: &RegressionPipeline,
    train: &[PropertyRecord],
    test_rows: &[PropertyFeatures],
    test_labels: &[f64],
) -> Result<TrainingMetrics, OracleError> {
    let preprocessor = pipeline.fitted()?.preprocessor();

    let train_rows: Vec<PropertyFeatures> = train.iter().map(|r| r.features.clone()).collect();
    let train_labels: Vec<f64> = train.iter().map(|r| r.price_uf).collect();
    let model = LinearBaseline::fit(&preprocessor.transform(&train_rows)?, &train_labels)?;

    let predicted = model.predict(&preprocessor.transform(test_rows)?);
    let undefined = || OracleError::Model("baseline metrics undefined".into());
    Ok(TrainingMetrics {
        r_squared: r_squared(test_labels, &predicted).ok_or_else(undefined)?,
        mean_absolute_error: mean_absolute_error(test_labels, &predicted).ok_or_else(undefined)?,
    })
}
