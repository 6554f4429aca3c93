//! Feature preprocessing.
//!
//! Turns raw `PropertyFeatures` into a fixed-width numeric row:
//!
//! ```text
//! [ z(surface_m2), z(distance_to_metro), onehot(district)... ]
//! ```
//!
//! - Numeric columns are standardized with the mean and population standard
//!   deviation observed at fit time. Those statistics are frozen; applying the
//!   preprocessor never recomputes them.
//! - The district one-hot block covers the vocabulary seen at fit time, sorted.
//!   A label outside that vocabulary encodes as an all-zero block (no location
//!   effect) rather than an error.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::PropertyFeatures;
use crate::error::OracleError;
use crate::math::{mean, population_std};

/// Frozen standardization statistics for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub mean: f64,
    /// Divisor applied after centering; 1.0 when the column had no spread.
    pub scale: f64,
}

impl ColumnScaler {
    fn fit(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let std = population_std(values)?;
        let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };
        Some(Self { mean, scale })
    }

    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// One-hot encoder over the districts seen at fit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted, deduplicated vocabulary; column `i` of the block is `categories[i]`.
    categories: Vec<String>,
}

impl OneHotEncoder {
    fn fit<'a>(labels: impl Iterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = labels.map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Column index of `label`, or `None` for an unseen label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    fn encode_into(&self, label: &str, out: &mut [f64]) {
        out.fill(0.0);
        if let Some(idx) = self.index_of(label) {
            out[idx] = 1.0;
        }
    }
}

/// Preprocessor with statistics and vocabulary learned from a training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    surface: ColumnScaler,
    distance: ColumnScaler,
    district: OneHotEncoder,
}

/// Number of leading standardized numeric columns.
pub const NUMERIC_WIDTH: usize = 2;

impl FittedPreprocessor {
    /// Learn scaling statistics and the district vocabulary.
    pub fn fit(rows: &[PropertyFeatures]) -> Result<Self, OracleError> {
        if rows.is_empty() {
            return Err(OracleError::InvalidDataset(
                "cannot fit preprocessor on zero rows".to_string(),
            ));
        }

        let surfaces: Vec<f64> = rows.iter().map(|r| r.surface_m2).collect();
        let distances: Vec<f64> = rows.iter().map(|r| r.distance_to_metro).collect();
        if surfaces.iter().chain(&distances).any(|v| !v.is_finite()) {
            return Err(OracleError::InvalidDataset(
                "non-finite numeric feature in training rows".to_string(),
            ));
        }

        let surface = ColumnScaler::fit(&surfaces)
            .ok_or_else(|| OracleError::InvalidDataset("surface_m2 statistics unavailable".to_string()))?;
        let distance = ColumnScaler::fit(&distances).ok_or_else(|| {
            OracleError::InvalidDataset("distance_to_metro statistics unavailable".to_string())
        })?;
        let district = OneHotEncoder::fit(rows.iter().map(|r| r.district.as_str()));

        Ok(Self {
            surface,
            distance,
            district,
        })
    }

    /// Width of every transformed row.
    pub fn width(&self) -> usize {
        NUMERIC_WIDTH + self.district.width()
    }

    pub fn surface_scaler(&self) -> ColumnScaler {
        self.surface
    }

    pub fn distance_scaler(&self) -> ColumnScaler {
        self.distance
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.district
    }

    /// Output column names, in transform order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![
            "num__surface_m2".to_string(),
            "num__distance_to_metro".to_string(),
        ];
        names.extend(
            self.district
                .categories()
                .iter()
                .map(|c| format!("cat__comuna_{c}")),
        );
        names
    }

    /// Transform a single row using the frozen statistics.
    pub fn transform_row(&self, row: &PropertyFeatures) -> Result<Vec<f64>, OracleError> {
        if !row.surface_m2.is_finite() {
            return Err(OracleError::InvalidInput(format!(
                "surface_m2 is not finite: {}",
                row.surface_m2
            )));
        }
        if !row.distance_to_metro.is_finite() {
            return Err(OracleError::InvalidInput(format!(
                "distance_to_metro is not finite: {}",
                row.distance_to_metro
            )));
        }

        let mut out = vec![0.0; self.width()];
        out[0] = self.surface.apply(row.surface_m2);
        out[1] = self.distance.apply(row.distance_to_metro);
        self.district.encode_into(&row.district, &mut out[NUMERIC_WIDTH..]);
        Ok(out)
    }

    /// Transform a batch (parallel over rows; output order matches input order).
    pub fn transform(&self, rows: &[PropertyFeatures]) -> Result<Vec<Vec<f64>>, OracleError> {
        rows.par_iter().map(|r| self.transform_row(r)).collect()
    }
}
