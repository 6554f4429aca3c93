//! Least-squares linear baseline.
//!
//! Fitted on the same preprocessed matrix as the booster and reported next to
//! it after each training run. It is never persisted or served.

use nalgebra::{DMatrix, DVector};

use crate::error::OracleError;
use crate::math::solve_least_squares;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearBaseline {
    /// Intercept first, then one coefficient per feature column.
    coefficients: Vec<f64>,
}

impl LinearBaseline {
    pub fn fit(features: &[Vec<f64>], labels: &[f64]) -> Result<Self, OracleError> {
        if features.is_empty() || features.len() != labels.len() {
            return Err(OracleError::Model(format!(
                "linear baseline needs matching non-empty inputs ({} rows, {} labels)",
                features.len(),
                labels.len()
            )));
        }
        let width = features[0].len();
        let n = features.len();

        let x = DMatrix::from_fn(n, width + 1, |r, c| if c == 0 { 1.0 } else { features[r][c - 1] });
        let y = DVector::from_row_slice(labels);

        let beta = solve_least_squares(&x, &y)
            .ok_or_else(|| OracleError::Model("linear baseline system is ill-conditioned".into()))?;

        Ok(Self {
            coefficients: beta.iter().copied().collect(),
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }

    pub fn predict(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features.iter().map(|r| self.predict_row(r)).collect()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}
