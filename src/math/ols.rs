//! Least squares regression.
//!
//! The forecaster seeds its optimizer with Hannan–Rissanen estimates, which are
//! two small regressions:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Design matrices are tall (more rows than columns) and can be nearly
//! collinear when a seasonal lag overlaps a long AR lag, so we solve via SVD
//! rather than QR or normal equations.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() < x.ncols() || x.ncols() == 0 {
        return None;
    }
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

/// Regress `y` on the columns built by `row(i, out)` for each row `i`.
pub fn regress_rows(
    n_rows: usize,
    n_cols: usize,
    y: impl Fn(usize) -> f64,
    row: impl Fn(usize, &mut [f64]),
) -> Option<DVector<f64>> {
    let mut x = DMatrix::<f64>::zeros(n_rows, n_cols);
    let mut yv = DVector::<f64>::zeros(n_rows);
    let mut buf = vec![0.0; n_cols];
    for i in 0..n_rows {
        row(i, &mut buf);
        for (j, &v) in buf.iter().enumerate() {
            x[(i, j)] = v;
        }
        yv[i] = y(i);
    }
    solve_least_squares(&x, &yv)
}
