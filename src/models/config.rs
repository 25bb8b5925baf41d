//! Configuration data model and validation

use crate::defaults;
use crate::types::{AppError, Result, RunMode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Main run configuration.
///
/// Built once at process start and threaded through every component via
/// the run context; no component reads configuration from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of participants in the simulated group
    #[serde(default = "default_participants")]
    pub participants: usize,

    /// Probe variant to execute
    #[serde(default = "default_mode")]
    pub mode: RunMode,

    /// Small payload size in bytes (two-point mode)
    #[serde(default = "default_small_bytes")]
    pub small_bytes: usize,

    /// Large payload size in bytes (two-point mode)
    #[serde(default = "default_large_bytes")]
    pub large_bytes: usize,

    /// Group sizes above this switch from full mesh to star pairs
    #[serde(default = "default_star_cutoff")]
    pub star_cutoff: usize,

    /// Payload sizes in blocks of 1024 bytes (multi-size mode)
    #[serde(default = "default_size_blocks")]
    pub size_blocks: Vec<usize>,

    /// Timings collected per payload size (multi-size mode)
    #[serde(default = "default_repeats")]
    pub repeats: usize,

    /// Bound in seconds on every receive and barrier wait
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Path the root participant writes the result file to
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            mode: default_mode(),
            small_bytes: default_small_bytes(),
            large_bytes: default_large_bytes(),
            star_cutoff: default_star_cutoff(),
            size_blocks: default_size_blocks(),
            repeats: default_repeats(),
            timeout_seconds: default_timeout_secs(),
            output: default_output(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl RunConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Multi-size payload sizes converted from blocks to bytes
    pub fn message_sizes_bytes(&self) -> Vec<usize> {
        self.size_blocks
            .iter()
            .map(|blocks| blocks * defaults::BLOCK_BYTES)
            .collect()
    }

    /// Path of the detailed companion file written in multi-size mode
    pub fn detailed_output(&self) -> String {
        format!("{}.detailed", self.output)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.participants < 2 {
            return Err(AppError::invalid_group_size(format!(
                "group of {} cannot be measured, need at least 2 participants",
                self.participants
            )));
        }

        if self.small_bytes == 0 {
            return Err(AppError::config("Small payload size must be greater than 0"));
        }

        if self.large_bytes <= self.small_bytes {
            return Err(AppError::config(format!(
                "Large payload ({} bytes) must exceed small payload ({} bytes)",
                self.large_bytes, self.small_bytes
            )));
        }

        if self.star_cutoff < 2 {
            return Err(AppError::config("Star cutoff must be at least 2"));
        }

        if self.mode == RunMode::MultiSize {
            if self.size_blocks.len() < 2 {
                return Err(AppError::config(
                    "Multi-size mode needs at least 2 payload sizes to fit a line",
                ));
            }

            if self.size_blocks.iter().any(|&blocks| blocks == 0) {
                return Err(AppError::config("Payload sizes must be greater than 0 blocks"));
            }

            if self.size_blocks.windows(2).any(|w| w[0] >= w[1]) {
                return Err(AppError::config(
                    "Payload sizes must be strictly increasing",
                ));
            }

            if self.repeats == 0 {
                return Err(AppError::config("Repeats must be greater than 0"));
            }
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.output.is_empty() {
            return Err(AppError::config("Output path cannot be empty"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration.
    ///
    /// A `.env` file in the working directory is honored if present.
    pub fn merge_from_env(&mut self) -> Result<()> {
        // Missing .env file is fine; only parse errors are reported
        let _ = dotenv::dotenv();

        if let Ok(participants) = std::env::var("PPB_PARTICIPANTS") {
            self.participants = participants.parse()?;
        }

        if let Ok(mode) = std::env::var("PPB_MODE") {
            self.mode = RunMode::from_str(&mode)?;
        }

        if let Ok(timeout) = std::env::var("PPB_TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.parse()?;
        }

        if let Ok(repeats) = std::env::var("PPB_REPEATS") {
            self.repeats = repeats.parse()?;
        }

        if let Ok(output) = std::env::var("PPB_OUTPUT") {
            self.output = output;
        }

        Ok(())
    }
}

fn default_participants() -> usize {
    4
}

fn default_mode() -> RunMode {
    RunMode::TwoPoint
}

fn default_small_bytes() -> usize {
    defaults::DEFAULT_SMALL_BYTES
}

fn default_large_bytes() -> usize {
    defaults::DEFAULT_LARGE_BYTES
}

fn default_star_cutoff() -> usize {
    defaults::DEFAULT_STAR_CUTOFF
}

fn default_size_blocks() -> Vec<usize> {
    defaults::DEFAULT_SIZE_BLOCKS.to_vec()
}

fn default_repeats() -> usize {
    defaults::DEFAULT_REPEATS
}

fn default_timeout_secs() -> u64 {
    defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_output() -> String {
    defaults::DEFAULT_OUTPUT.to_string()
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
