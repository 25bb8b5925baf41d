//! Pairwise Ping-Pong Benchmark - CLI entry point
//!
//! Spawns one Tokio task per participant over the in-process group
//! runtime, runs the pairwise measurement protocol, and prints the
//! ranked results from the root participant.

use clap::Parser;
use futures::future::join_all;
use pingpong_bench::{
    cli::Cli,
    comm::LocalGroup,
    error::{AppError, Result},
    logging::Logger,
    models::RunConfig,
    output,
    runner::{RunContext, RunOutput},
    PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(true));
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let config = cli.to_config()?;

    if config.debug {
        println!("{} v{} (built {})", PKG_NAME, VERSION, env!("BUILD_TIME"));
        println!("Configuration:");
        println!("  Participants: {}", config.participants);
        println!("  Mode: {}", config.mode);
        println!("  Payloads: {} / {} bytes", config.small_bytes, config.large_bytes);
        println!("  Star cutoff: {}", config.star_cutoff);
        println!("  Timeout: {}s", config.timeout_seconds);
        println!("  Output: {}", config.output);
        println!();
    }

    let output = execute_group(&config).await?;

    let formatter = output::create_formatter(config.enable_color);
    println!("{}", formatter.format_summary(&output.result_set));

    if config.verbose {
        if let Some(fits) = &output.multi_fits {
            println!("{}", formatter.format_multi_fits(fits));
        }
        println!("Results written to {}", config.output);
    }

    Ok(())
}

/// Run every participant as a task and return the root's output.
async fn execute_group(config: &RunConfig) -> Result<RunOutput> {
    let endpoints = LocalGroup::create(config.participants, config.timeout())?;
    let run_id = Logger::new_run_id();

    let handles: Vec<_> = endpoints
        .into_iter()
        .map(|endpoint| {
            let config = config.clone();
            let run_id = run_id.clone();
            tokio::spawn(async move {
                let ctx = RunContext::new(Arc::new(endpoint), config, run_id)?;
                ctx.run().await
            })
        })
        .collect();

    let mut root_output = None;
    for joined in join_all(handles).await {
        let participant_result = joined
            .map_err(|e| AppError::internal(format!("participant task panicked: {}", e)))??;
        if let Some(out) = participant_result {
            root_output = Some(out);
        }
    }

    root_output.ok_or_else(|| AppError::internal("no participant produced a result set"))
}
