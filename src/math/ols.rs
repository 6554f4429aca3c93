//! Least squares solver.
//!
//! Used to fit the linear baseline that every training run reports next to the
//! boosted model:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD solve, because the design matrix is tall (rows ≫ columns).
//! - The one-hot district block plus an intercept column is exactly collinear,
//!   so the solver must tolerate a rank-deficient matrix. SVD with a singular
//!   value cutoff yields the minimum-norm solution in that case.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
