//! Data models and structures for the ping-pong benchmark

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::RunConfig;
pub use metrics::{DetailedResults, FitStatus, Measurement, ResultSet, Sample, SampleMatrix};
