//! Formatted terminal output.
//!
//! Formatting lives in one place so the analysis code stays clean and output
//! changes stay localized.

use std::collections::BTreeMap;

use crate::domain::{BatchOutput, ForecastResult, GrowthSeries, MonthTotal, PeriodChange, RangeChange};

const NAME_WIDTH: usize = 20;

/// Growth table: one block per series.
pub fn format_growth(growth: &BatchOutput<GrowthSeries>) -> String {
    let mut out = String::new();
    out.push_str("=== Growth since anchor ===\n");
    for (name, series) in &growth.results {
        out.push_str(&format!(
            "\n{name} (anchor {} = {})\n",
            series.anchor_date,
            fmt_value(series.anchor_value)
        ));
        for p in &series.points {
            out.push_str(&format!("  {}  {:>10}\n", p.date, fmt_percent(p.growth_percent)));
        }
    }
    out.push_str(&format_batch_notes(growth));
    out
}

/// Period-over-period changes plus the per-series median.
pub fn format_changes(
    changes: &BatchOutput<Vec<PeriodChange>>,
    medians: &BatchOutput<Option<f64>>,
) -> String {
    let mut out = String::new();
    out.push_str("=== Period changes ===\n");
    for (name, rows) in &changes.results {
        let median = medians
            .results
            .get(name)
            .copied()
            .flatten()
            .map(fmt_percent)
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!("\n{name} (median {median})\n"));
        for c in rows {
            out.push_str(&format!(
                "  {} -> {}  {:>10}\n",
                c.previous_date,
                c.date,
                fmt_percent(c.percent)
            ));
        }
    }
    out.push_str(&format_batch_notes(changes));
    out
}

/// Start-to-end change per series.
pub fn format_range(range: &BatchOutput<RangeChange>) -> String {
    let mut out = String::new();
    out.push_str("=== Range change ===\n");
    out.push_str(&header_line(&["series", "start", "value", "end", "value", "change"]));
    for (name, rc) in &range.results {
        out.push_str(
            format!(
                "{:<w$} {:>10} {:>12} {:>10} {:>12} {:>10}\n",
                truncate(name, NAME_WIDTH),
                rc.start_date,
                fmt_value(rc.start_value),
                rc.end_date,
                fmt_value(rc.end_value),
                fmt_percent(rc.percent),
                w = NAME_WIDTH
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format_batch_notes(range));
    out
}

/// Per-series totals for one calendar month.
pub fn format_totals(year: i32, month: u32, totals: &BTreeMap<String, MonthTotal>) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Totals for {year:04}-{month:02} ===\n"));
    out.push_str(&format!(
        "{:<w$} {:>14} {:>6}\n",
        "series",
        "total",
        "count",
        w = NAME_WIDTH
    ));
    for (name, t) in totals {
        out.push_str(&format!(
            "{:<w$} {:>14} {:>6}\n",
            truncate(name, NAME_WIDTH),
            fmt_value(t.total),
            t.count,
            w = NAME_WIDTH
        ));
    }
    out
}

/// Forecast tables plus fitted coefficients.
pub fn format_forecasts(forecasts: &BatchOutput<ForecastResult>) -> String {
    let mut out = String::new();
    out.push_str("=== Forecast ===\n");
    for res in forecasts.results.values() {
        let o = res.order;
        let so = res.seasonal_order;
        out.push_str(&format!(
            "\n{} SARIMA({},{},{})({},{},{},{}) | {:.0}% interval | n={}\n",
            res.series_name,
            o.p,
            o.d,
            o.q,
            so.p,
            so.d,
            so.q,
            so.period,
            res.confidence_level * 100.0,
            res.diagnostics.n_obs
        ));
        let d = &res.diagnostics;
        out.push_str(&format!(
            "  ar={} ma={} sar={} sma={} sigma2={:.4}\n",
            fmt_vec(&d.ar),
            fmt_vec(&d.ma),
            fmt_vec(&d.seasonal_ar),
            fmt_vec(&d.seasonal_ma),
            d.sigma2
        ));
        out.push_str(&format!(
            "  {:<10} {:>14} {:>14} {:>14}\n",
            "date", "forecast", "lower", "upper"
        ));
        for p in &res.points {
            out.push_str(&format!(
                "  {:<10} {:>14} {:>14} {:>14}\n",
                p.date.to_string(),
                fmt_value(p.point_estimate),
                fmt_value(p.lower_bound),
                fmt_value(p.upper_bound)
            ));
        }
    }
    out.push_str(&format_batch_notes(forecasts));
    out
}

/// Skipped series and per-series failures, one qualified line each.
pub fn format_batch_notes<T>(batch: &BatchOutput<T>) -> String {
    let mut out = String::new();
    if !batch.skipped.is_empty() {
        out.push_str(&format!("\n(skipped by override) {}\n", batch.skipped.join(", ")));
    }
    if !batch.failures.is_empty() {
        out.push_str("\nFailed series:\n");
        for f in &batch.failures {
            out.push_str(&format!("  - {}: {}\n", f.series, f.error));
        }
    }
    out
}

fn header_line(cols: &[&str; 6]) -> String {
    let mut out = format!(
        "{:<w$} {:>10} {:>12} {:>10} {:>12} {:>10}",
        cols[0],
        cols[1],
        cols[2],
        cols[3],
        cols[4],
        cols[5],
        w = NAME_WIDTH
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<w$} {:-<10} {:-<12} {:-<10} {:-<12} {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        w = NAME_WIDTH
    ));
    out
}

fn fmt_percent(v: f64) -> String {
    format!("{v:+.2}%")
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
