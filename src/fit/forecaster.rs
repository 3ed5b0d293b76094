//! Seasonal ARIMA forecasting for one series (or every series of a table).
//!
//! Pipeline per series:
//!
//! - validate config, horizon and history (count + monthly spacing)
//! - difference the levels: `w = (1-B)^d (1-B^s)^D y`
//! - minimize the conditional sum of squares from several starts (parallel)
//! - pick the best converged start deterministically
//! - forecast `w`, integrate back to levels, attach psi-weight intervals
//!
//! A failed fit is always reported as `ModelFit`; there is no fallback model.

use std::time::Instant;

use chrono::{Datelike, Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::{
    BatchOutput, FitDiagnostics, ForecastConfig, ForecastPoint, ForecastResult, SeriesView, TimeSeriesTable,
};
use crate::error::AnalyticsError;
use crate::fit::optimizer::{Minimum, NelderMeadOptions, Termination, nelder_mead};
use crate::fit::start::hannan_rissanen;
use crate::math::normal_critical_value;
use crate::models::{SarimaSpec, css, css_residuals, forecast_differenced, psi_weights};

/// Half-width of the uniform jitter applied to random starts.
const JITTER: f64 = 0.5;

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    min: Minimum,
}

/// Forecast `horizon` monthly steps past the last observation of `series`.
pub fn forecast(
    series: &SeriesView<'_>,
    horizon: usize,
    config: &ForecastConfig,
) -> Result<ForecastResult, AnalyticsError> {
    config.validate()?;
    if horizon == 0 {
        return Err(AnalyticsError::invalid_input("horizon must be >= 1."));
    }

    let name = series.name.to_string();
    let spec = SarimaSpec::new(config.order, config.seasonal_order);
    let period = config.seasonal_order.period;

    let obs: Vec<(NaiveDate, f64)> = series.observations().collect();
    let required = (2 * period).max(spec.diff_len() + spec.param_len() + 1);
    if obs.len() < required {
        return Err(AnalyticsError::InsufficientHistory {
            series: name,
            required,
            actual: obs.len(),
            period,
        });
    }
    ensure_monthly(&name, &obs)?;

    let y: Vec<f64> = obs.iter().map(|(_, v)| *v).collect();
    let stages = spec.difference_stages(&y);
    let w = &stages.differenced;

    let best = fit_css(&name, &spec, w, config)?;
    let params = &best.min.x;
    let css_value = best.min.value;
    let sigma2 = css_value / w.len() as f64;

    let ar = spec.ar_lags(params);
    let ma = spec.ma_lags(params);
    let resid = css_residuals(w, &ar, &ma);
    let w_forecast = forecast_differenced(w, &resid, &ar, &ma, horizon);
    let levels = stages.integrate(&w_forecast);

    let psi = psi_weights(&spec.integrated_ar_lags(params), &ma, horizon);
    let z = normal_critical_value(config.confidence_level)
        .ok_or_else(|| AnalyticsError::invalid_input("confidence_level must be in (0, 1)."))?;

    let last_date = obs[obs.len() - 1].0;
    let mut points = Vec::with_capacity(horizon);
    let mut cum_psi2 = 0.0;
    for (h, (&point, &psi_h)) in levels.iter().zip(&psi).enumerate() {
        cum_psi2 += psi_h * psi_h;
        let sd = (sigma2 * cum_psi2).sqrt();
        if !(point.is_finite() && sd.is_finite()) {
            return Err(AnalyticsError::ModelFit {
                series: name,
                reason: format!("non-finite forecast at step {}.", h + 1),
            });
        }
        let date = last_date
            .checked_add_months(Months::new(h as u32 + 1))
            .ok_or_else(|| AnalyticsError::invalid_input("forecast date out of range."))?;
        points.push(ForecastPoint {
            date,
            point_estimate: point,
            lower_bound: point - z * sd,
            upper_bound: point + z * sd,
        });
    }

    let split = spec.split(params);
    let diagnostics = FitDiagnostics {
        ar: split.ar.to_vec(),
        ma: split.ma.to_vec(),
        seasonal_ar: split.sar.to_vec(),
        seasonal_ma: split.sma.to_vec(),
        sigma2,
        css: css_value,
        n_obs: obs.len(),
        iterations: best.min.iterations,
    };

    log::info!(
        "forecast '{name}': n={} sigma2={sigma2:.4} css={css_value:.4} start={} iters={}",
        obs.len(),
        best.idx,
        best.min.iterations
    );

    Ok(ForecastResult {
        series_name: name,
        horizon,
        confidence_level: config.confidence_level,
        order: config.order,
        seasonal_order: config.seasonal_order,
        points,
        diagnostics,
    })
}

/// Forecast the named series of `table`.
pub fn forecast_series(
    table: &TimeSeriesTable,
    name: &str,
    horizon: usize,
    config: &ForecastConfig,
) -> Result<ForecastResult, AnalyticsError> {
    let view = table.require_series(name)?;
    forecast(&view, horizon, config)
}

/// Forecast every series of `table` in parallel; failures are per series.
pub fn forecast_table(
    table: &TimeSeriesTable,
    horizon: usize,
    config: &ForecastConfig,
) -> BatchOutput<ForecastResult> {
    let views: Vec<SeriesView<'_>> = table.iter_series().collect();
    let outcomes: Vec<(&str, Result<ForecastResult, AnalyticsError>)> = views
        .par_iter()
        .map(|view| (view.name, forecast(view, horizon, config)))
        .collect();

    let mut out = BatchOutput::default();
    for (name, outcome) in outcomes {
        out.record(name, outcome);
    }
    out
}

fn fit_css(
    name: &str,
    spec: &SarimaSpec,
    w: &[f64],
    config: &ForecastConfig,
) -> Result<Candidate, AnalyticsError> {
    let starts = build_starts(spec, w, config);
    let opts = NelderMeadOptions {
        max_iterations: config.max_iterations,
        f_tolerance: config.tolerance,
        deadline: config.time_budget.map(|b| Instant::now() + b),
        ..NelderMeadOptions::default()
    };

    // Evaluate each start independently (parallel).
    let candidates: Vec<Candidate> = starts
        .par_iter()
        .enumerate()
        .map(|(idx, x0)| Candidate {
            idx,
            min: nelder_mead(|x| css(spec, w, x), x0, &opts),
        })
        .collect();

    for c in &candidates {
        log::debug!(
            "'{name}' start {}: css={:.6} iters={} {:?}",
            c.idx,
            c.min.value,
            c.min.iterations,
            c.min.termination
        );
    }

    // Deterministic selection: minimum CSS among converged starts; ties go to
    // the earlier start.
    let best = candidates
        .iter()
        .filter(|c| c.min.converged() && c.min.value.is_finite())
        .fold(None::<&Candidate>, |best, c| match best {
            Some(b) if b.min.value <= c.min.value => Some(b),
            _ => Some(c),
        });

    match best {
        Some(b) => Ok(b.clone()),
        None if candidates
            .iter()
            .any(|c| c.min.termination == Termination::Deadline) =>
        {
            Err(AnalyticsError::ModelFit {
                series: name.to_string(),
                reason: format!(
                    "time budget of {:.1}s exhausted before convergence.",
                    config.time_budget.map(|b| b.as_secs_f64()).unwrap_or_default()
                ),
            })
        }
        None => Err(AnalyticsError::ModelFit {
            series: name.to_string(),
            reason: format!(
                "optimizer did not converge within {} iterations from any of {} starts.",
                config.max_iterations,
                candidates.len()
            ),
        }),
    }
}

/// Optimizer starts: Hannan–Rissanen (when identifiable), zeros, then
/// `config.restarts` seeded jittered points.
fn build_starts(spec: &SarimaSpec, w: &[f64], config: &ForecastConfig) -> Vec<Vec<f64>> {
    let k = spec.param_len();
    let mut starts = Vec::with_capacity(config.restarts + 2);
    if let Some(hr) = hannan_rissanen(spec, w) {
        starts.push(hr);
    }
    starts.push(vec![0.0; k]);
    if k == 0 {
        return starts;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    for _ in 0..config.restarts {
        starts.push((0..k).map(|_| rng.gen_range(-JITTER..JITTER)).collect());
    }
    starts
}

/// Present observations must be consecutive calendar months.
fn ensure_monthly(name: &str, obs: &[(NaiveDate, f64)]) -> Result<(), AnalyticsError> {
    for pair in obs.windows(2) {
        let (a, b) = (pair[0].0, pair[1].0);
        if month_index(b) - month_index(a) != 1 {
            return Err(AnalyticsError::invalid_input(format!(
                "series '{name}' is not monthly: {a} is followed by {b}."
            )));
        }
    }
    Ok(())
}

fn month_index(d: NaiveDate) -> i32 {
    d.year() * 12 + d.month0() as i32
}
