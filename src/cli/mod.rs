//! Command-line interface

use crate::defaults;
use crate::error::{AppError, Result};
use crate::models::RunConfig;
use crate::types::RunMode;
use clap::Parser;
use std::str::FromStr;

/// Pairwise Ping-Pong Benchmark - measures point-to-point latency and
/// bandwidth between all pairs of a participant group
#[derive(Parser, Debug, Clone)]
#[command(name = "ppb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of participants in the simulated group
    #[arg(short = 'n', long, env = "PPB_PARTICIPANTS")]
    pub participants: Option<usize>,

    /// Probe variant: two-point or multi-size
    #[arg(short, long, default_value = "two-point")]
    pub mode: String,

    /// Small payload size in bytes (two-point mode)
    #[arg(long, default_value_t = defaults::DEFAULT_SMALL_BYTES)]
    pub small_bytes: usize,

    /// Large payload size in bytes (two-point mode)
    #[arg(long, default_value_t = defaults::DEFAULT_LARGE_BYTES)]
    pub large_bytes: usize,

    /// Group sizes above this use the star scheme instead of the full mesh
    #[arg(long, default_value_t = defaults::DEFAULT_STAR_CUTOFF)]
    pub star_cutoff: usize,

    /// Payload sizes in 1024-byte blocks, comma-separated (multi-size mode)
    #[arg(long)]
    pub sizes: Option<String>,

    /// Timings per payload size (multi-size mode)
    #[arg(short, long, default_value_t = defaults::DEFAULT_REPEATS)]
    pub repeats: usize,

    /// Bound in seconds on every receive and barrier wait
    #[arg(short, long, default_value_t = defaults::DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Result file path
    #[arg(short, long, default_value = defaults::DEFAULT_OUTPUT)]
    pub output: String,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<()> {
        if self.color && self.no_color {
            return Err(AppError::validation(
                "Cannot specify both --color and --no-color",
            ));
        }
        Ok(())
    }

    /// Build the run configuration: defaults, then environment, then
    /// CLI flags (CLI wins).
    pub fn to_config(&self) -> Result<RunConfig> {
        self.validate()?;

        let mut config = RunConfig::default();
        config.merge_from_env()?;

        config.participants = match self.participants {
            Some(n) => n,
            None => {
                if config.participants != RunConfig::default().participants {
                    // Already set through the environment
                    config.participants
                } else {
                    // Enough tasks to be interesting without oversubscribing
                    num_cpus::get().clamp(2, 8)
                }
            }
        };

        config.mode = RunMode::from_str(&self.mode)?;
        config.small_bytes = self.small_bytes;
        config.large_bytes = self.large_bytes;
        config.star_cutoff = self.star_cutoff;
        config.repeats = self.repeats;
        config.timeout_seconds = self.timeout;
        config.output = self.output.clone();

        if let Some(sizes) = &self.sizes {
            config.size_blocks = parse_size_list(sizes)?;
        }

        if self.no_color {
            config.enable_color = false;
        } else if self.color {
            config.enable_color = true;
        }
        config.verbose = self.verbose;
        config.debug = self.debug;

        config.validate()?;
        Ok(config)
    }
}

/// Parse a comma-separated list of block counts
fn parse_size_list(input: &str) -> Result<Vec<usize>> {
    input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| AppError::parse(format!("Invalid size '{}': {}", part.trim(), e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli::parse_from(["ppb"])
    }

    #[test]
    fn test_color_conflict_rejected() {
        let mut cli = base_cli();
        cli.color = true;
        cli.no_color = true;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_default_config_from_cli() {
        let config = base_cli().to_config().unwrap();
        assert!(config.participants >= 2);
        assert_eq!(config.mode, RunMode::TwoPoint);
        assert_eq!(config.output, "results.bin");
    }

    #[test]
    fn test_explicit_participants_and_mode() {
        let cli = Cli::parse_from(["ppb", "-n", "6", "--mode", "multi-size"]);
        let config = cli.to_config().unwrap();
        assert_eq!(config.participants, 6);
        assert_eq!(config.mode, RunMode::MultiSize);
    }

    #[test]
    fn test_size_list_parsing() {
        assert_eq!(parse_size_list("1, 10,20").unwrap(), vec![1, 10, 20]);
        assert!(parse_size_list("1,x").is_err());

        let cli = Cli::parse_from(["ppb", "--mode", "multi-size", "--sizes", "1,10,20"]);
        let config = cli.to_config().unwrap();
        assert_eq!(config.size_blocks, vec![1, 10, 20]);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let cli = Cli::parse_from(["ppb", "--mode", "warp-speed"]);
        assert!(cli.to_config().is_err());
    }
}
