//! Lag-polynomial and differencing helpers.
//!
//! Polynomials are stored as coefficient vectors in powers of the backshift
//! operator `B`: `[c0, c1, c2, ...]` means `c0 + c1 B + c2 B^2 + ...`.

/// Multiply two lag polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c1 B^lag + c2 B^{2 lag} + ...)`.
pub fn lag_poly(coeffs: &[f64], lag: usize, sign: f64) -> Vec<f64> {
    let mut out = vec![0.0; coeffs.len() * lag + 1];
    out[0] = 1.0;
    for (k, &c) in coeffs.iter().enumerate() {
        out[(k + 1) * lag] = sign * c;
    }
    out
}

/// `(1 - B^lag)^order`.
pub fn diff_poly(lag: usize, order: usize) -> Vec<f64> {
    let mut out = vec![1.0];
    let mut step = vec![0.0; lag + 1];
    step[0] = 1.0;
    step[lag] = -1.0;
    for _ in 0..order {
        out = poly_mul(&out, &step);
    }
    out
}

/// Apply `(1 - B^lag)` once.
pub fn difference(values: &[f64], lag: usize) -> Vec<f64> {
    if values.len() <= lag {
        return Vec::new();
    }
    (lag..values.len()).map(|t| values[t] - values[t - lag]).collect()
}

/// Invert one `(1 - B^lag)` step for future values.
///
/// `history` is the undifferenced series so far; `diffs` are forecasts of its
/// lag-`lag` differences. Returns the undifferenced forecasts.
pub fn integrate(history: &[f64], diffs: &[f64], lag: usize) -> Vec<f64> {
    let mut extended = history.to_vec();
    for &dv in diffs {
        let base = extended[extended.len() - lag];
        extended.push(base + dv);
    }
    extended.split_off(history.len())
}
