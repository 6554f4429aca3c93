//! Descriptive statistics and regression accuracy metrics.
//!
//! All functions are pure and return `None` on empty or mismatched input
//! instead of producing `NaN`.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant target has no variance to explain: a perfect prediction scores
/// 1.0 and anything else 0.0.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() {
        return None;
    }
    let mu = mean(actual)?;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p) * (y - p))
        .sum();
    let ss_tot: f64 = actual.iter().map(|y| (y - mu) * (y - mu)).sum();

    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

/// Mean absolute error.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return None;
    }
    let total: f64 = actual.iter().zip(predicted).map(|(y, p)| (y - p).abs()).sum();
    Some(total / actual.len() as f64)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_match_hand_computation() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        assert!((population_std(&v).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn r_squared_perfect_and_mean_predictor() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(r_squared(&y, &y), Some(1.0));

        let mean_pred = [2.5; 4];
        assert!(r_squared(&y, &mean_pred).unwrap().abs() < 1e-12);

        // Worse than the mean goes negative.
        let bad = [4.0, 3.0, 2.0, 1.0];
        assert!(r_squared(&y, &bad).unwrap() < 0.0);
    }

    #[test]
    fn r_squared_constant_target() {
        assert_eq!(r_squared(&[3.0, 3.0], &[3.0, 3.0]), Some(1.0));
        assert_eq!(r_squared(&[3.0, 3.0], &[2.0, 3.0]), Some(0.0));
    }

    #[test]
    fn mae_basic() {
        let mae = mean_absolute_error(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]).unwrap();
        assert!((mae - 1.0).abs() < 1e-12);
        assert_eq!(mean_absolute_error(&[1.0], &[]), None);
    }

    #[test]
    fn rounding_two_decimals() {
        assert_eq!(round_to(2.214, 2), 2.21);
        assert_eq!(round_to(2.216, 2), 2.22);
        assert_eq!(round_to(-1.005_1, 2), -1.01);
    }
}
