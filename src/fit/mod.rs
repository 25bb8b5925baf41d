//! Model fitting: timing samples to latency/bandwidth estimates
//!
//! Two forms. The two-point fit converts one `(t_small, t_large)` sample
//! into a rate and latency directly. The least-squares fit takes the
//! multi-size sample matrix, reduces each size's repeats to a central
//! tendency, and fits `y = m*x + c` by ordinary least squares, reporting
//! `rate = 1/m` and `latency = c`. Mean, median, and minimum reductions
//! are fitted independently and all three are reported: mean is
//! sensitive to tail noise, median is robust, minimum approximates
//! best-case uncontended performance.

use crate::error::{AppError, Result};
use crate::models::{Measurement, Sample, SampleMatrix};
use serde::{Deserialize, Serialize};

/// Bits transferred for a payload of `bytes`: 8 bits per byte, both
/// directions of the round trip.
pub fn bits_both_ways(bytes: usize) -> f64 {
    16.0 * bytes as f64
}

/// Fit the two-point latency/size model to a sample.
pub fn two_point(sample: Sample, small_bytes: usize, large_bytes: usize) -> Measurement {
    Measurement::from_sample(sample, small_bytes, large_bytes)
}

/// Per-size reduction applied to repeated timings before fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentralTendency {
    Mean,
    Median,
    Min,
}

impl CentralTendency {
    /// Reduce a non-empty slice of timings
    pub fn reduce(&self, timings: &[f64]) -> f64 {
        match self {
            CentralTendency::Mean => timings.iter().sum::<f64>() / timings.len() as f64,
            CentralTendency::Median => {
                let mut sorted = timings.to_vec();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            CentralTendency::Min => timings.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Ordinary least squares for `y = m*x + c`; returns `(m, c)`.
pub fn least_squares(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    if x.len() != y.len() {
        return Err(AppError::validation(format!(
            "least squares over {} x values but {} y values",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(AppError::validation(
            "least squares needs at least 2 points",
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        sxx += (xi - mean_x) * (xi - mean_x);
        sxy += (xi - mean_x) * (yi - mean_y);
    }

    if sxx == 0.0 {
        return Err(AppError::validation(
            "least squares over degenerate x values (no spread)",
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Ok((slope, intercept))
}

/// Convert a fitted line into a measurement.
///
/// A zero or negative slope means a non-positive rate; that fit is
/// reported as invalid rather than as an infinite or negative bandwidth.
pub fn line_to_measurement(slope: f64, intercept: f64) -> Measurement {
    if slope <= 0.0 {
        Measurement::invalid()
    } else {
        Measurement::from_fit(1.0 / slope, intercept)
    }
}

/// The three independent least-squares fits for one pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiFit {
    /// Fit over per-size means
    pub mean: Measurement,
    /// Fit over per-size medians
    pub median: Measurement,
    /// Fit over per-size minima
    pub min: Measurement,
}

impl MultiFit {
    /// The measurement used for the summary result file (mean fit,
    /// matching the reference output).
    pub fn summary(&self) -> Measurement {
        self.mean
    }
}

/// Fit all three central tendencies of a sample matrix.
pub fn fit_matrix(matrix: &SampleMatrix) -> Result<MultiFit> {
    matrix.validate()?;
    if matrix.sizes_bytes.len() < 2 {
        return Err(AppError::model_fit(
            "sample matrix needs at least 2 sizes for a line fit",
        ));
    }

    let x: Vec<f64> = matrix
        .sizes_bytes
        .iter()
        .map(|&bytes| bits_both_ways(bytes))
        .collect();

    let fit_for = |tendency: CentralTendency| -> Result<Measurement> {
        let y: Vec<f64> = matrix
            .timings
            .iter()
            .map(|row| tendency.reduce(row))
            .collect();
        let (slope, intercept) = least_squares(&x, &y)?;
        Ok(line_to_measurement(slope, intercept))
    };

    Ok(MultiFit {
        mean: fit_for(CentralTendency::Mean)?,
        median: fit_for(CentralTendency::Median)?,
        min: fit_for(CentralTendency::Min)?,
    })
}
