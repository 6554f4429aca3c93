//! Seeded train/held-out split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::OracleError;

#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffle with `seed` and hold out `ceil(n * test_fraction)` rows.
///
/// Identical input, fraction and seed always yield the identical partition.
pub fn train_test_split<T: Clone>(rows: &[T], test_fraction: f64, seed: u64) -> Result<Split<T>, OracleError> {
    if !(test_fraction.is_finite() && test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(OracleError::InvalidInput(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n = rows.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(OracleError::InvalidDataset(format!(
            "{n} rows are too few to hold out {:.0}% and still train",
            test_fraction * 100.0
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    Ok(Split {
        train: train_idx.iter().map(|&i| rows[i].clone()).collect(),
        test: test_idx.iter().map(|&i| rows[i].clone()).collect(),
    })
}
