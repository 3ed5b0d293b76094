//! Multiplicative seasonal ARIMA model evaluation.
//!
//! With `w = (1-B)^d (1-B^s)^D y` the model is
//!
//! ```text
//! φ(B) Φ(B^s) w_t = θ(B) Θ(B^s) ε_t
//! ```
//!
//! Expanding both sides gives plain lag coefficients `a_k` (AR) and `m_k` (MA):
//!
//! ```text
//! w_t = Σ a_k w_{t-k} + ε_t + Σ m_k ε_{t-k}
//! ```
//!
//! The fitter only needs two primitives from this module: the conditional sum
//! of squares for a parameter vector, and forecasts with psi-weight variances
//! for the fitted model.

use crate::domain::{SarimaOrder, SeasonalOrder};
use crate::math::{diff_poly, difference, integrate, lag_poly, poly_mul};

/// Model structure (orders only, no coefficients).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SarimaSpec {
    pub order: SarimaOrder,
    pub seasonal: SeasonalOrder,
}

impl SarimaSpec {
    pub fn new(order: SarimaOrder, seasonal: SeasonalOrder) -> Self {
        Self { order, seasonal }
    }

    /// Length of the flat parameter vector `[φ.., θ.., Φ.., Θ..]`.
    pub fn param_len(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Observations consumed by differencing.
    pub fn diff_len(&self) -> usize {
        self.order.d + self.seasonal.d * self.seasonal.period
    }

    /// Apply `(1-B)^d (1-B^s)^D`, remembering each intermediate series so
    /// forecasts can be integrated back to levels.
    pub fn difference_stages(&self, y: &[f64]) -> DiffStages {
        let lags = std::iter::repeat_n(1, self.order.d)
            .chain(std::iter::repeat_n(self.seasonal.period, self.seasonal.d));

        let mut stages = Vec::new();
        let mut current = y.to_vec();
        for lag in lags {
            let next = difference(&current, lag);
            stages.push((current, lag));
            current = next;
        }
        DiffStages {
            stages,
            differenced: current,
        }
    }

    /// Apply `(1-B)^d (1-B^s)^D`.
    pub fn differenced(&self, y: &[f64]) -> Vec<f64> {
        self.difference_stages(y).differenced
    }

    /// Split a flat parameter vector into its four coefficient groups.
    pub fn split<'a>(&self, params: &'a [f64]) -> SarimaParams<'a> {
        let (ar, rest) = params.split_at(self.order.p);
        let (ma, rest) = rest.split_at(self.order.q);
        let (sar, sma) = rest.split_at(self.seasonal.p);
        SarimaParams { ar, ma, sar, sma }
    }

    /// Expanded AR lag coefficients `a_1..` of `φ(B) Φ(B^s)`.
    pub fn ar_lags(&self, params: &[f64]) -> Vec<f64> {
        let p = self.split(params);
        let poly = poly_mul(
            &lag_poly(p.ar, 1, -1.0),
            &lag_poly(p.sar, self.seasonal.period, -1.0),
        );
        poly.iter().skip(1).map(|c| -c).collect()
    }

    /// Expanded MA lag coefficients `m_1..` of `θ(B) Θ(B^s)`.
    pub fn ma_lags(&self, params: &[f64]) -> Vec<f64> {
        let p = self.split(params);
        let poly = poly_mul(
            &lag_poly(p.ma, 1, 1.0),
            &lag_poly(p.sma, self.seasonal.period, 1.0),
        );
        poly.into_iter().skip(1).collect()
    }

    /// AR lag coefficients of the integrated model on levels `y`, i.e. the
    /// expansion of `φ(B) Φ(B^s) (1-B)^d (1-B^s)^D`.
    pub fn integrated_ar_lags(&self, params: &[f64]) -> Vec<f64> {
        let p = self.split(params);
        let s = self.seasonal.period;
        let mut poly = poly_mul(&lag_poly(p.ar, 1, -1.0), &lag_poly(p.sar, s, -1.0));
        poly = poly_mul(&poly, &diff_poly(1, self.order.d));
        poly = poly_mul(&poly, &diff_poly(s, self.seasonal.d));
        poly.iter().skip(1).map(|c| -c).collect()
    }
}

/// A series after differencing, plus what is needed to undo it.
#[derive(Debug, Clone)]
pub struct DiffStages {
    /// `(input series, lag)` for each differencing step, in application order.
    stages: Vec<(Vec<f64>, usize)>,
    pub differenced: Vec<f64>,
}

impl DiffStages {
    /// Turn forecasts of the differenced series into forecasts of levels.
    pub fn integrate(&self, forecasts: &[f64]) -> Vec<f64> {
        let mut out = forecasts.to_vec();
        for (history, lag) in self.stages.iter().rev() {
            out = integrate(history, &out, *lag);
        }
        out
    }
}

/// Borrowed coefficient groups of a flat parameter vector.
#[derive(Debug, Clone, Copy)]
pub struct SarimaParams<'a> {
    pub ar: &'a [f64],
    pub ma: &'a [f64],
    pub sar: &'a [f64],
    pub sma: &'a [f64],
}

/// Innovations `ε_t` of the differenced series, with pre-sample values of
/// both `w` and `ε` taken as zero.
pub fn css_residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let mut pred = 0.0;
        for (k, &a) in ar.iter().enumerate() {
            let lag = k + 1;
            if lag > t {
                break;
            }
            pred += a * w[t - lag];
        }
        for (k, &m) in ma.iter().enumerate() {
            let lag = k + 1;
            if lag > t {
                break;
            }
            pred += m * e[t - lag];
        }
        e[t] = w[t] - pred;
    }
    e
}

/// Conditional sum of squares for `params`; `+∞` when the recursion blows up.
pub fn css(spec: &SarimaSpec, w: &[f64], params: &[f64]) -> f64 {
    let e = css_residuals(w, &spec.ar_lags(params), &spec.ma_lags(params));
    let sse: f64 = e.iter().map(|v| v * v).sum();
    if sse.is_finite() { sse } else { f64::INFINITY }
}

/// Recursive point forecasts of the differenced series `h` steps ahead.
///
/// Future innovations are zero; pre-sample values are zero as in the fit.
pub fn forecast_differenced(w: &[f64], e: &[f64], ar: &[f64], ma: &[f64], h: usize) -> Vec<f64> {
    let n = w.len();
    let mut wx = w.to_vec();
    let mut ex = e.to_vec();
    for t in n..n + h {
        let mut pred = 0.0;
        for (k, &a) in ar.iter().enumerate() {
            let lag = k + 1;
            if lag > t {
                break;
            }
            pred += a * wx[t - lag];
        }
        for (k, &m) in ma.iter().enumerate() {
            let lag = k + 1;
            if lag > t {
                break;
            }
            pred += m * ex[t - lag];
        }
        wx.push(pred);
        ex.push(0.0);
    }
    wx.split_off(n)
}

/// First `h` psi-weights of `M(B) / A*(B)`, where `A*` is the integrated AR
/// polynomial given by its lag coefficients.
pub fn psi_weights(integrated_ar: &[f64], ma: &[f64], h: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(h);
    for j in 0..h {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut v = ma.get(j - 1).copied().unwrap_or(0.0);
        for (k, &a) in integrated_ar.iter().enumerate().take(j) {
            v += a * psi[j - k - 1];
        }
        psi.push(v);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(p: usize, d: usize, q: usize, sp: usize, sd: usize, sq: usize, s: usize) -> SarimaSpec {
        SarimaSpec::new(
            SarimaOrder { p, d, q },
            SeasonalOrder {
                p: sp,
                d: sd,
                q: sq,
                period: s,
            },
        )
    }

    #[test]
    fn expands_multiplicative_lags() {
        let sp = spec(1, 1, 1, 1, 1, 1, 4);
        let params = [0.5, 0.3, 0.2, -0.4];
        let ar = sp.ar_lags(&params);
        // (1 - 0.5B)(1 - 0.2B^4) -> a = [0.5, 0, 0, 0.2, -0.1]
        assert_eq!(ar.len(), 5);
        assert!((ar[0] - 0.5).abs() < 1e-12);
        assert!((ar[3] - 0.2).abs() < 1e-12);
        assert!((ar[4] + 0.1).abs() < 1e-12);

        let ma = sp.ma_lags(&params);
        // (1 + 0.3B)(1 - 0.4B^4) -> m = [0.3, 0, 0, -0.4, -0.12]
        assert!((ma[0] - 0.3).abs() < 1e-12);
        assert!((ma[3] + 0.4).abs() < 1e-12);
        assert!((ma[4] + 0.12).abs() < 1e-12);

        assert_eq!(sp.param_len(), 4);
        assert_eq!(sp.diff_len(), 5);
    }

    #[test]
    fn css_is_zero_for_exact_ar1() {
        let sp = spec(1, 0, 0, 0, 0, 0, 12);
        // w_0 = 1 is itself a residual (pre-sample zero), so start from 0 after a shock.
        let w: Vec<f64> = (0..10).map(|t| 0.8_f64.powi(t)).collect();
        let e = css_residuals(&w, &sp.ar_lags(&[0.8]), &sp.ma_lags(&[0.8]));
        assert!((e[0] - 1.0).abs() < 1e-12);
        assert!(e[1..].iter().all(|v| v.abs() < 1e-12));
        assert!((css(&sp, &w, &[0.8]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn random_walk_psi_weights_are_one() {
        // ARIMA(0,1,0): A*(B) = 1 - B, psi_j = 1 for all j.
        let sp = spec(0, 1, 0, 0, 0, 0, 12);
        let a = sp.integrated_ar_lags(&[]);
        assert_eq!(a, vec![1.0]);
        assert_eq!(psi_weights(&a, &[], 4), vec![1.0; 4]);
    }

    #[test]
    fn ma1_psi_weights() {
        // ARIMA(0,0,1) with θ = 0.5: psi = [1, 0.5, 0, 0].
        let sp = spec(0, 0, 1, 0, 0, 0, 12);
        let a = sp.integrated_ar_lags(&[0.5]);
        let m = sp.ma_lags(&[0.5]);
        assert_eq!(psi_weights(&a, &m, 4), vec![1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn ar1_forecast_decays() {
        let w = [0.0, 0.0, 2.0];
        let e = [0.0, 0.0, 0.0];
        let f = forecast_differenced(&w, &e, &[0.5], &[], 3);
        assert_eq!(f, vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn diff_stages_integrate_back_to_levels() {
        let sp = spec(0, 1, 0, 0, 1, 0, 3);
        let y: Vec<f64> = (0..12).map(|t| (t * t) as f64 + [0.0, 4.0, -2.0][t % 3]).collect();
        let (hist, tail) = y.split_at(9);

        // Differences of the full series, restricted to the held-out tail,
        // must integrate back to the tail exactly.
        let full = sp.difference_stages(&y).differenced;
        let stages = sp.difference_stages(hist);
        let tail_diffs = &full[full.len() - tail.len()..];
        let rebuilt = stages.integrate(tail_diffs);
        for (a, b) in rebuilt.iter().zip(tail) {
            assert!((a - b).abs() < 1e-9, "{rebuilt:?} vs {tail:?}");
        }
    }

    #[test]
    fn seasonal_differencing_removes_fixed_pattern() {
        let sp = spec(0, 0, 0, 0, 1, 0, 4);
        let pattern = [1.0, 5.0, 3.0, 2.0];
        let y: Vec<f64> = (0..12).map(|t| pattern[t % 4]).collect();
        let w = sp.differenced(&y);
        assert_eq!(w.len(), 8);
        assert!(w.iter().all(|v| *v == 0.0));
    }
}
