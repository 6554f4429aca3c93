//! Human-readable summaries for `generate`, `train` and `predict`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{PredictionResult, PropertyFeatures, PropertyRecord};
use crate::fit::TrainingRun;

/// Per-district row counts and mean rent of a generated dataset.
pub fn format_dataset_summary(records: &[PropertyRecord], path: &Path) -> String {
    let mut out = String::new();
    out.push_str("=== oracle - simulated market data ===\n");
    out.push_str(&format!("Rows: {} -> {}\n\n", records.len(), path.display()));

    let mut by_district: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for r in records {
        let entry = by_district.entry(r.features.district.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += r.price_uf;
    }

    out.push_str(&format!("{:<18} {:>6} {:>12}\n", "comuna", "rows", "mean_uf"));
    out.push_str(&format!("{:-<18} {:-<6} {:-<12}\n", "", "", ""));
    for (district, (count, total)) in by_district {
        out.push_str(&format!(
            "{:<18} {:>6} {:>12.2}\n",
            truncate(district, 18),
            count,
            total / count as f64
        ));
    }
    out
}

/// Metrics, baseline comparison and error band of a finished training run.
pub fn format_training_summary(run: &TrainingRun) -> String {
    let mut out = String::new();
    out.push_str("=== oracle - training run ===\n");
    out.push_str(&format!(
        "Rows: read={} skipped={} | train={} test={}\n",
        run.rows_read, run.rows_skipped, run.n_train, run.n_test
    ));
    out.push_str(&format!(
        "Booster: trees={} depth={} lr={} min_leaf={}\n",
        run.params.n_estimators, run.params.max_depth, run.params.learning_rate, run.params.min_leaf_size
    ));

    out.push_str("\nHeld-out metrics:\n");
    out.push_str(&format!(
        "* {:<18} R2={:.4} MAE={:.4} UF\n",
        "gradient boosting", run.metrics.r_squared, run.metrics.mean_absolute_error
    ));
    match &run.baseline {
        Some(b) => out.push_str(&format!(
            "  {:<18} R2={:.4} MAE={:.4} UF\n",
            "linear baseline", b.r_squared, b.mean_absolute_error
        )),
        None => out.push_str("  (linear baseline unavailable)\n"),
    }

    out.push_str(&format!("\nConfidence band: +/- {:.2} UF\n", run.confidence.half_width));
    out.push_str(&format!("Artifact: {}\n", run.model_path.display()));
    out
}

pub fn format_prediction(features: &PropertyFeatures, result: &PredictionResult) -> String {
    format!(
        "{} | {} m2 | {} m to metro -> {:.2} {} [{:.2}, {:.2}]",
        features.district,
        features.surface_m2,
        features.distance_to_metro,
        result.estimate,
        result.unit.code(),
        result.lower_bound,
        result.upper_bound
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
