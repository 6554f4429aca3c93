//! End-to-end properties of training and serving, on a small simulated market.

use std::path::Path;

use property_oracle::data::generate_market_data;
use property_oracle::domain::{District, PropertyFeatures, TrainConfig};
use property_oracle::error::OracleError;
use property_oracle::fit::{TrainingRun, run_training, train_on_records};
use property_oracle::io::{ModelArtifact, read_artifact, write_artifact, write_dataset};
use property_oracle::serve::{PredictionOutcome, ServingContext};
use tempfile::TempDir;

const ROWS: usize = 600;
const TREES: usize = 60;

fn config_in(dir: &Path) -> TrainConfig {
    let mut config = TrainConfig::new(dir.join("raw/market_data.csv"), dir.join("models/model.json"));
    config.booster.n_estimators = TREES;
    config
}

fn train_fresh() -> (TempDir, TrainConfig, TrainingRun) {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_dataset(&config.data_path, &generate_market_data(ROWS, 7).unwrap()).unwrap();
    let run = run_training(&config).unwrap();
    (dir, config, run)
}

fn cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn ready(context: &ServingContext, features: &PropertyFeatures) -> property_oracle::domain::PredictionResult {
    match context.predict(features) {
        PredictionOutcome::Ready(result) => result,
        other => panic!("expected a ready prediction, got {other:?}"),
    }
}

#[test]
fn every_estimate_sits_strictly_inside_a_band_of_width_two_e() {
    let (_dir, config, run) = train_fresh();
    let context = ServingContext::load(&config.model_path).unwrap();
    let e = run.confidence.half_width;
    assert!(e > 0.0);

    for district in District::ALL {
        for (surface, distance) in [(25.0, 50.0), (55.0, 350.0), (140.0, 2500.0)] {
            let result = ready(&context, &PropertyFeatures::for_district(district, surface, distance));
            assert!(result.lower_bound < result.estimate, "{district}: {result:?}");
            assert!(result.estimate < result.upper_bound, "{district}: {result:?}");
            assert_eq!(
                cents(result.upper_bound) - cents(result.lower_bound),
                2 * cents(e),
                "{district}: {result:?}"
            );
        }
    }
}

#[test]
fn reloaded_artifact_predicts_exactly_what_was_trained() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let records = generate_market_data(ROWS, 7).unwrap();
    let trained = train_on_records(&records, &config).unwrap();

    let rows: Vec<PropertyFeatures> = trained.held_out.iter().map(|r| r.features.clone()).collect();
    assert_eq!(rows.len(), ROWS / 5);
    let fitted = trained.pipeline.into_fitted().unwrap();
    let in_memory = fitted.predict(&rows).unwrap();

    write_artifact(&config.model_path, &ModelArtifact::new(fitted, trained.metrics)).unwrap();
    let artifact = read_artifact(&config.model_path).unwrap();
    assert_eq!(artifact.metrics, trained.metrics);

    let from_file = artifact.pipeline.predict(&rows).unwrap();
    assert_eq!(from_file.len(), in_memory.len());
    for (a, b) in in_memory.iter().zip(&from_file) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn training_is_deterministic_for_a_fixed_seed() {
    let (_a, _, first) = train_fresh();
    let (_b, _, second) = train_fresh();
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!((first.n_train, first.n_test), (second.n_train, second.n_test));
}

#[test]
fn held_out_split_is_eighty_twenty() {
    let (_dir, _, run) = train_fresh();
    assert_eq!(run.n_train + run.n_test, ROWS);
    assert_eq!(run.n_test, ROWS / 5);
}

#[test]
fn unknown_district_label_still_gets_a_finite_estimate() {
    let (_dir, config, _) = train_fresh();
    let context = ServingContext::load(&config.model_path).unwrap();
    let result = ready(&context, &PropertyFeatures::new("Lo Prado", 60.0, 500.0));
    assert!(result.estimate.is_finite());
}

#[test]
fn larger_apartments_cost_more_on_average() {
    let (_dir, config, _) = train_fresh();
    let context = ServingContext::load(&config.model_path).unwrap();

    for distance in [50.0, 400.0, 1500.0, 3000.0] {
        let mut small = 0.0;
        let mut large = 0.0;
        for district in District::ALL {
            small += ready(&context, &PropertyFeatures::for_district(district, 35.0, distance)).estimate;
            large += ready(&context, &PropertyFeatures::for_district(district, 120.0, distance)).estimate;
        }
        assert!(large > small, "distance={distance} small={small} large={large}");
    }
}

#[test]
fn providencia_reference_apartment_is_priced_plausibly() {
    let (_dir, config, _) = train_fresh();
    let context = ServingContext::load(&config.model_path).unwrap();
    let result = ready(&context, &PropertyFeatures::for_district(District::Providencia, 55.0, 350.0));
    assert!(result.estimate > 0.0 && result.estimate < 50.0, "{result:?}");
}

#[test]
fn without_an_artifact_every_request_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let context = ServingContext::load(&dir.path().join("models/model.json")).unwrap();
    assert!(!context.health().model_loaded);

    let outcome = context.predict(&PropertyFeatures::for_district(District::Macul, 50.0, 100.0));
    assert_eq!(outcome, PredictionOutcome::Unavailable);
    assert_eq!(outcome.status_code(), 503);
}

#[test]
fn missing_dataset_leaves_no_artifact_behind() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let err = run_training(&config).unwrap_err();
    assert!(matches!(err, OracleError::DataSourceMissing(_)));
    assert!(!config.model_path.exists());
}

#[test]
fn shared_context_serves_concurrent_requests() {
    let (_dir, config, _) = train_fresh();
    let context = ServingContext::load(&config.model_path).unwrap();
    let expected = ready(&context, &PropertyFeatures::for_district(District::Santiago, 45.0, 300.0));

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..25 {
                    let got = ready(&context, &PropertyFeatures::for_district(District::Santiago, 45.0, 300.0));
                    assert_eq!(got, expected);
                }
            });
        }
    });
}
