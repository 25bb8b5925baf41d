//! Output formatting and display
//!
//! Renders the aggregated result set as a ranked table, fastest pair
//! first, with colored and plain text implementations behind a common
//! formatter trait.

use crate::fit::MultiFit;
use crate::models::{Measurement, ResultSet};
use crate::types::Pair;
use colored::Colorize;

/// Formatter seam for rendering a result set
pub trait ResultFormatter: Send + Sync {
    /// Render the ranked summary table
    fn format_summary(&self, results: &ResultSet) -> String;

    /// Render the per-pair mean/median/min fits (multi-size mode)
    fn format_multi_fits(&self, fits: &[(Pair, MultiFit)]) -> String;
}

/// Create a formatter based on color preference
pub fn create_formatter(enable_color: bool) -> Box<dyn ResultFormatter> {
    if enable_color {
        Box::new(ColoredFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

/// Humanize a rate in bits per second
pub fn format_rate(rate_bps: f64) -> String {
    if rate_bps >= 1e9 {
        format!("{:.2} Gbit/s", rate_bps / 1e9)
    } else if rate_bps >= 1e6 {
        format!("{:.2} Mbit/s", rate_bps / 1e6)
    } else if rate_bps >= 1e3 {
        format!("{:.2} kbit/s", rate_bps / 1e3)
    } else {
        format!("{:.2} bit/s", rate_bps)
    }
}

/// Humanize a latency in seconds
pub fn format_latency(latency_secs: f64) -> String {
    if latency_secs.abs() >= 1e-3 {
        format!("{:.3} ms", latency_secs * 1e3)
    } else {
        format!("{:.1} µs", latency_secs * 1e6)
    }
}

fn measurement_cells(measurement: &Measurement) -> (String, String) {
    if measurement.is_valid() {
        (
            format_latency(measurement.latency_secs),
            format_rate(measurement.rate_bps),
        )
    } else {
        ("-".to_string(), "invalid fit".to_string())
    }
}

fn summary_header(results: &ResultSet) -> String {
    format!(
        "Ping-pong results: {} participants, {} scheme, {} mode, {} pairs ({} invalid fits)",
        results.group_size,
        results.scheme,
        results.mode,
        results.len(),
        results.invalid_count()
    )
}

/// Plain text formatter without any color codes
pub struct PlainFormatter;

impl ResultFormatter for PlainFormatter {
    fn format_summary(&self, results: &ResultSet) -> String {
        let mut out = String::new();
        out.push_str(&summary_header(results));
        out.push('\n');
        out.push_str(&format!(
            "{:<6} {:<10} {:>12} {:>14}\n",
            "rank", "pair", "latency", "bandwidth"
        ));

        for (position, (pair, measurement)) in results.ranked().iter().enumerate() {
            let (latency, rate) = measurement_cells(measurement);
            out.push_str(&format!(
                "{:<6} {:<10} {:>12} {:>14}\n",
                position + 1,
                pair.to_string(),
                latency,
                rate
            ));
        }
        out
    }

    fn format_multi_fits(&self, fits: &[(Pair, MultiFit)]) -> String {
        let mut out = String::new();
        out.push_str("Per-pair fits (mean / median / min):\n");
        for (pair, fit) in fits {
            let (mean_lat, mean_rate) = measurement_cells(&fit.mean);
            let (median_lat, median_rate) = measurement_cells(&fit.median);
            let (min_lat, min_rate) = measurement_cells(&fit.min);
            out.push_str(&format!(
                "{:<10} mean {} @ {} | median {} @ {} | min {} @ {}\n",
                pair.to_string(),
                mean_lat,
                mean_rate,
                median_lat,
                median_rate,
                min_lat,
                min_rate
            ));
        }
        out
    }
}

/// Formatter with ANSI colors for interactive terminals
pub struct ColoredFormatter;

impl ResultFormatter for ColoredFormatter {
    fn format_summary(&self, results: &ResultSet) -> String {
        let mut out = String::new();
        out.push_str(&summary_header(results).bold().to_string());
        out.push('\n');
        out.push_str(&format!(
            "{:<6} {:<10} {:>12} {:>14}\n",
            "rank".bold(),
            "pair".bold(),
            "latency".bold(),
            "bandwidth".bold()
        ));

        for (position, (pair, measurement)) in results.ranked().iter().enumerate() {
            let line = if measurement.is_valid() {
                let latency = format_latency(measurement.latency_secs);
                let rate = format_rate(measurement.rate_bps);
                let colored_rate = if position == 0 {
                    rate.green().to_string()
                } else {
                    rate.normal().to_string()
                };
                format!(
                    "{:<6} {:<10} {:>12} {:>14}\n",
                    position + 1,
                    pair.to_string(),
                    latency,
                    colored_rate
                )
            } else {
                format!(
                    "{:<6} {:<10} {:>12} {:>14}\n",
                    position + 1,
                    pair.to_string(),
                    "-",
                    "invalid fit".red().to_string()
                )
            };
            out.push_str(&line);
        }
        out
    }

    fn format_multi_fits(&self, fits: &[(Pair, MultiFit)]) -> String {
        // Same layout as plain; only the heading is emphasized
        let plain = PlainFormatter.format_multi_fits(fits);
        let mut lines = plain.lines();
        let heading = lines.next().unwrap_or_default().bold().to_string();
        let mut out = heading;
        out.push('\n');
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
