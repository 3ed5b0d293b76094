//! Starting values for the optimizer (Hannan–Rissanen).
//!
//! 1. Fit a long AR model by least squares; its residuals stand in for the
//!    unobserved innovations.
//! 2. Regress `w_t` on its own AR lags and on lagged residual proxies, one
//!    column per coefficient (seasonal terms at multiples of `s`).
//!
//! The second regression treats the seasonal and non-seasonal parts additively,
//! so the estimates are only a starting point; the CSS fit refines them.

use crate::math::regress_rows;
use crate::models::SarimaSpec;

/// Starts are clamped into this box so a poorly identified regression cannot
/// launch the simplex from an explosive region.
const START_BOUND: f64 = 0.95;

/// Hannan–Rissanen start for `spec` on the differenced series `w`.
///
/// `None` when there are too few observations for either regression.
pub fn hannan_rissanen(spec: &SarimaSpec, w: &[f64]) -> Option<Vec<f64>> {
    let k = spec.param_len();
    if k == 0 {
        return Some(Vec::new());
    }

    let s = spec.seasonal.period;
    let o = spec.order;
    let so = spec.seasonal;
    let n = w.len();

    // Long AR order: enough to cover the model's longest lag, capped by data.
    let max_lag = (o.p + so.p * s).max(o.q + so.q * s).max(1);
    let long = max_lag.min(n / 3);
    if long == 0 {
        return None;
    }

    let phi_long = regress_rows(n - long, long, |i| w[i + long], |i, out| {
        for (j, v) in out.iter_mut().enumerate() {
            *v = w[i + long - j - 1];
        }
    })?;

    let mut resid = vec![0.0; n];
    for t in long..n {
        let pred: f64 = (0..long).map(|j| phi_long[j] * w[t - j - 1]).sum();
        resid[t] = w[t] - pred;
    }

    let ar_span = o.p.max(so.p * s);
    let ma_span = o.q.max(so.q * s);
    let first = ar_span.max(long + ma_span);
    if n <= first || n - first < k + 2 {
        return None;
    }

    let lags = coefficient_lags(spec);
    let beta = regress_rows(n - first, k, |i| w[i + first], |i, out| {
        let t = i + first;
        for (col, lag) in out.iter_mut().zip(&lags) {
            *col = match *lag {
                Lag::Ar(l) => w[t - l],
                Lag::Ma(l) => resid[t - l],
            };
        }
    })?;

    Some(beta.iter().map(|b| b.clamp(-START_BOUND, START_BOUND)).collect())
}

#[derive(Debug, Clone, Copy)]
enum Lag {
    Ar(usize),
    Ma(usize),
}

/// Regressor lag for each slot of the flat parameter vector `[φ.., θ.., Φ.., Θ..]`.
fn coefficient_lags(spec: &SarimaSpec) -> Vec<Lag> {
    let s = spec.seasonal.period;
    let mut lags = Vec::with_capacity(spec.param_len());
    lags.extend((1..=spec.order.p).map(Lag::Ar));
    lags.extend((1..=spec.order.q).map(Lag::Ma));
    lags.extend((1..=spec.seasonal.p).map(|j| Lag::Ar(j * s)));
    lags.extend((1..=spec.seasonal.q).map(|j| Lag::Ma(j * s)));
    lags
}
