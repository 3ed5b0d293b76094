//! Command-line parsing for the growth metrics tool.
//!
//! Argument parsing and command dispatch stay separate from the analysis code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{SarimaOrder, SeasonalOrder};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gm", version, about = "Social audience growth metrics and forecasts")]
pub struct Cli {
    /// Wide CSV export: a `date` column plus one column per series.
    #[arg(short = 'i', long, global = true, value_name = "CSV", default_value = "metrics.csv")]
    pub input: PathBuf,

    /// Keep only rows on or after this date.
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Keep only rows on or before this date.
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Print results as JSON instead of text tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebase every series to percent growth since its anchor.
    Growth(GrowthArgs),
    /// Period-over-period percent changes and their median per series.
    Change,
    /// Percent change between the rows nearest two dates.
    Range(RangeArgs),
    /// Sum of each series within one calendar month.
    Totals(TotalsArgs),
    /// Seasonal ARIMA forecast with confidence bounds.
    Forecast(ForecastArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GrowthArgs {
    /// Anchor overrides JSON (array of `{series_name, anchor_date, display_start_date?, skip?}`).
    #[arg(long, value_name = "JSON")]
    pub overrides: Option<PathBuf>,

    /// Export growth series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RangeArgs {
    #[arg(long, value_parser = parse_date_arg)]
    pub start: NaiveDate,

    #[arg(long, value_parser = parse_date_arg)]
    pub end: NaiveDate,
}

#[derive(Debug, Args, Clone)]
pub struct TotalsArgs {
    /// Month to total, as `YYYY-MM`.
    #[arg(long, value_parser = parse_month_arg)]
    pub month: (i32, u32),
}

/// Options for forecasting.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Forecast only this series (default: every series).
    #[arg(short = 's', long)]
    pub series: Option<String>,

    /// Number of months to forecast.
    #[arg(long, default_value_t = 12)]
    pub horizon: usize,

    /// Non-seasonal order `p,d,q`.
    #[arg(long, default_value = "1,1,1")]
    pub order: SarimaOrder,

    /// Seasonal order `P,D,Q,s`.
    #[arg(long = "seasonal-order", default_value = "1,1,1,12")]
    pub seasonal_order: SeasonalOrder,

    /// Confidence level of the forecast interval.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Seed for the jittered optimizer starts.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of jittered optimizer starts.
    #[arg(long, default_value_t = 4)]
    pub restarts: usize,

    /// Iteration cap per optimizer start.
    #[arg(long = "max-iter", default_value_t = 5000)]
    pub max_iter: usize,

    /// Wall-clock budget per series fit, in seconds.
    #[arg(long = "budget-secs")]
    pub budget_secs: Option<f64>,

    /// Export forecasts to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    crate::io::parse_date(s)
}

fn parse_month_arg(s: &str) -> Result<(i32, u32), String> {
    crate::io::parse_month(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_orders_parse_from_flags() {
        let cli = Cli::parse_from([
            "gm",
            "--input",
            "data.csv",
            "forecast",
            "--order",
            "2,1,0",
            "--seasonal-order",
            "(0,1,1,4)",
            "--horizon",
            "6",
        ]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };
        assert_eq!(args.order, SarimaOrder { p: 2, d: 1, q: 0 });
        assert_eq!(
            args.seasonal_order,
            SeasonalOrder {
                p: 0,
                d: 1,
                q: 1,
                period: 4
            }
        );
        assert_eq!(args.horizon, 6);
        assert_eq!(cli.input, PathBuf::from("data.csv"));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["gm", "totals", "--month", "2024-02", "--from", "2024-01-01", "--json"]);
        assert!(cli.json);
        assert_eq!(cli.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        let Command::Totals(args) = cli.command else {
            panic!("expected totals command");
        };
        assert_eq!(args.month, (2024, 2));
    }

    #[test]
    fn malformed_order_is_rejected() {
        let res = Cli::try_parse_from(["gm", "forecast", "--order", "1,1"]);
        assert!(res.is_err());
    }
}
