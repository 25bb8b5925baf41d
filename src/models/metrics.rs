//! Timing samples, fitted measurements, and the aggregated result set

use crate::error::{AppError, Result};
use crate::types::{Pair, PairScheme, RunMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Two round-trip timings for one pair, produced by the initiator.
///
/// `t_small` and `t_large` are full round-trip times in seconds for the
/// small and large payloads; they include responder dispatch latency by
/// design, since only the initiator runs a timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Round-trip time for the small payload, in seconds
    pub t_small: f64,
    /// Round-trip time for the large payload, in seconds
    pub t_large: f64,
}

impl Sample {
    pub fn new(t_small: f64, t_large: f64) -> Self {
        Self { t_small, t_large }
    }
}

/// Raw timings from the multi-size probe: one row per payload size,
/// `repeats` round-trip timings per row, all in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMatrix {
    /// Payload sizes in bytes, one per row
    pub sizes_bytes: Vec<usize>,
    /// Timings collected per size
    pub repeats: usize,
    /// `sizes_bytes.len()` rows of `repeats` timings each
    pub timings: Vec<Vec<f64>>,
}

impl SampleMatrix {
    pub fn new(sizes_bytes: Vec<usize>, repeats: usize) -> Self {
        let rows = sizes_bytes.len();
        Self {
            sizes_bytes,
            repeats,
            timings: Vec::with_capacity(rows),
        }
    }

    /// Check the matrix has the declared shape
    pub fn validate(&self) -> Result<()> {
        if self.timings.len() != self.sizes_bytes.len() {
            return Err(AppError::validation(format!(
                "Sample matrix has {} rows for {} sizes",
                self.timings.len(),
                self.sizes_bytes.len()
            )));
        }
        for (i, row) in self.timings.iter().enumerate() {
            if row.len() != self.repeats {
                return Err(AppError::validation(format!(
                    "Sample matrix row {} has {} timings, expected {}",
                    i,
                    row.len(),
                    self.repeats
                )));
            }
        }
        Ok(())
    }
}

/// Whether a fitted measurement is physically meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStatus {
    /// Positive rate, usable measurement
    Valid,
    /// Non-positive denominator or slope; measurement noise
    Invalid,
}

/// Latency/bandwidth estimate derived from a Sample.
///
/// `rate = 8*(L − S) / (t_large − t_small)` in bits per second, using the
/// size delta to cancel per-call overhead; `latency = t_small − S/rate`,
/// the time-axis intercept of the linear model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Transfer rate in bits per second
    pub rate_bps: f64,
    /// Fixed per-exchange latency in seconds
    pub latency_secs: f64,
    /// Validity of the fit
    pub status: FitStatus,
}

impl Measurement {
    /// Fit the two-point model to a sample.
    ///
    /// `t_large > t_small` is required for a positive rate; a violation is
    /// recorded as an invalid measurement, never as an infinite or
    /// negative rate.
    pub fn from_sample(sample: Sample, small_bytes: usize, large_bytes: usize) -> Self {
        let dt = sample.t_large - sample.t_small;
        if dt <= 0.0 {
            return Self::invalid();
        }

        let rate_bps = (8.0 * (large_bytes as f64 - small_bytes as f64)) / dt;
        let latency_secs = sample.t_small - small_bytes as f64 / rate_bps;

        Self {
            rate_bps,
            latency_secs,
            status: FitStatus::Valid,
        }
    }

    /// Sentinel for a fit that is not physically meaningful
    pub fn invalid() -> Self {
        Self {
            rate_bps: 0.0,
            latency_secs: 0.0,
            status: FitStatus::Invalid,
        }
    }

    pub fn from_fit(rate_bps: f64, latency_secs: f64) -> Self {
        Self {
            rate_bps,
            latency_secs,
            status: FitStatus::Valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == FitStatus::Valid
    }

    /// Rate in gigabits per second
    pub fn rate_gbps(&self) -> f64 {
        self.rate_bps / 1e9
    }

    /// Latency in microseconds
    pub fn latency_us(&self) -> f64 {
        self.latency_secs * 1e6
    }
}

/// Group-wide mapping from pair to measurement, owned by the root
/// participant after aggregation. Pairs keep the enumerator's order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// Run correlation id
    pub run_id: String,
    /// Probe variant that produced the measurements
    pub mode: RunMode,
    /// Pair scheme used for this group size
    pub scheme: PairScheme,
    /// Number of participants
    pub group_size: usize,
    /// When aggregation completed
    pub created_at: DateTime<Utc>,
    /// Measured pairs in enumeration order
    pub pairs: Vec<Pair>,
    /// One measurement per pair, parallel to `pairs`
    pub measurements: Vec<Measurement>,
}

impl ResultSet {
    pub fn new(
        run_id: String,
        mode: RunMode,
        scheme: PairScheme,
        group_size: usize,
        pairs: Vec<Pair>,
        measurements: Vec<Measurement>,
    ) -> Self {
        Self {
            run_id,
            mode,
            scheme,
            group_size,
            created_at: Utc::now(),
            pairs,
            measurements,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of measurements flagged as invalid fits
    pub fn invalid_count(&self) -> usize {
        self.measurements.iter().filter(|m| !m.is_valid()).count()
    }

    /// The parallel `(latencies, rates)` sequences in enumeration order
    pub fn parallel_sequences(&self) -> (Vec<f64>, Vec<f64>) {
        let latencies = self.measurements.iter().map(|m| m.latency_secs).collect();
        let rates = self.measurements.iter().map(|m| m.rate_bps).collect();
        (latencies, rates)
    }

    /// Pairs ranked by fitted bandwidth, fastest first; invalid fits sort
    /// to the end.
    pub fn ranked(&self) -> Vec<(Pair, Measurement)> {
        let mut entries: Vec<(Pair, Measurement)> = self
            .pairs
            .iter()
            .copied()
            .zip(self.measurements.iter().copied())
            .collect();
        entries.sort_by(|a, b| {
            match (a.1.is_valid(), b.1.is_valid()) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => b
                    .1
                    .rate_bps
                    .partial_cmp(&a.1.rate_bps)
                    .unwrap_or(std::cmp::Ordering::Equal),
            }
        });
        entries
    }

    /// Write the parallel `(latencies, rates)` sequences as opaque binary.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &self.parallel_sequences())?;
        Ok(())
    }

    /// Read back the parallel sequences written by `write_to`.
    pub fn read_parallel(path: impl AsRef<Path>) -> Result<(Vec<f64>, Vec<f64>)> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let sequences = bincode::deserialize_from(reader)?;
        Ok(sequences)
    }
}

/// Raw multi-size data written next to the fitted summary, mirroring the
/// probe's `(sizes, repeats, matrices)` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedResults {
    pub sizes_bytes: Vec<usize>,
    pub repeats: usize,
    pub entries: Vec<(Pair, SampleMatrix)>,
}

impl DetailedResults {
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let detailed = bincode::deserialize_from(reader)?;
        Ok(detailed)
    }
}
