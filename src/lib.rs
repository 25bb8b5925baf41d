//! Pairwise Ping-Pong Benchmark
//!
//! A distributed micro-benchmark that measures point-to-point latency and
//! bandwidth between all pairs of participants in a process group by timing
//! small and large round-trip exchanges and fitting a linear latency/size
//! model to the samples.

pub mod aggregate;
pub mod cli;
pub mod comm;
pub mod error;
pub mod fit;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod runner;
pub mod topology;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Measurement, ResultSet, RunConfig, Sample, SampleMatrix};
pub use topology::enumerate_pairs;
pub use types::{Pair, PairScheme, Role, RunMode};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Base block size shared by both probe variants
    pub const BLOCK_BYTES: usize = 1024;
    /// Small payload for the two-point probe
    pub const DEFAULT_SMALL_BYTES: usize = BLOCK_BYTES;
    /// Large payload for the two-point probe
    pub const DEFAULT_LARGE_BYTES: usize = 1024 * BLOCK_BYTES;
    /// Group sizes above this measure a star anchored at rank 0 instead of
    /// the full quadratic mesh
    pub const DEFAULT_STAR_CUTOFF: usize = 32;
    /// Payload sizes for the multi-size probe, in blocks
    pub const DEFAULT_SIZE_BLOCKS: &[usize] = &[1, 10, 20, 40, 70, 100];
    /// Timings collected per payload size in multi-size mode
    pub const DEFAULT_REPEATS: usize = 20;
    /// Bound on every blocking receive and barrier wait
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Result file written by the root participant
    pub const DEFAULT_OUTPUT: &str = "results.bin";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
