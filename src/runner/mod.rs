//! Round orchestration
//!
//! `RunContext` binds one participant's communicator, configuration, and
//! logger together at process start; rank and group size are never read
//! from globals. The round loop is identical on every participant: walk
//! the shared pair schedule, resolve the local role, probe if active,
//! and close every round with the full-group barrier so no participant
//! races ahead of a responder that is still listening.

use crate::aggregate;
use crate::comm::GroupComm;
use crate::error::{AppError, Result};
use crate::fit::MultiFit;
use crate::logging::Logger;
use crate::models::{DetailedResults, ResultSet, RunConfig, Sample, SampleMatrix};
use crate::probe::{self, CommPairProbe, PairProbe};
use crate::topology::{enumerate_pairs, scheme_for};
use crate::types::{Pair, PairScheme, RunMode};
use std::collections::HashMap;
use std::sync::Arc;

/// Rank that owns aggregation and the result file
pub const ROOT: usize = 0;

/// Everything the root produces at the end of a run
#[derive(Debug)]
pub struct RunOutput {
    pub result_set: ResultSet,
    /// Per-pair mean/median/min fits, multi-size mode only
    pub multi_fits: Option<Vec<(Pair, MultiFit)>>,
}

/// One participant's view of a benchmark run
pub struct RunContext {
    comm: Arc<dyn GroupComm>,
    config: RunConfig,
    run_id: String,
    logger: Logger,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("rank", &self.comm.rank())
            .field("size", &self.comm.size())
            .field("config", &self.config)
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Build a context, failing fast if the group cannot be measured.
    pub fn new(comm: Arc<dyn GroupComm>, config: RunConfig, run_id: String) -> Result<Self> {
        if comm.size() < 2 {
            return Err(AppError::invalid_group_size(
                "running in serial, no ping pong results",
            ));
        }

        let logger = Logger::with_config("RUNNER", &config)
            .for_rank(comm.rank())
            .with_run_id(run_id.clone());

        Ok(Self {
            comm,
            config,
            run_id,
            logger,
        })
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn group_size(&self) -> usize {
        self.comm.size()
    }

    pub fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    pub fn scheme(&self) -> PairScheme {
        scheme_for(self.group_size(), self.config.star_cutoff)
    }

    /// The pair schedule every participant derives identically
    pub fn schedule(&self) -> Vec<Pair> {
        enumerate_pairs(self.group_size(), self.config.star_cutoff)
    }

    /// Execute the configured run mode.
    ///
    /// Returns `Some(output)` on the root after aggregation and
    /// persistence, `None` on every other participant.
    pub async fn run(&self) -> Result<Option<RunOutput>> {
        match self.config.mode {
            RunMode::TwoPoint => self.run_two_point().await,
            RunMode::MultiSize => {
                let probe = CommPairProbe::new(self.comm.as_ref());
                self.run_multi_size(&probe).await
            }
        }
    }

    /// Two-point mode: one small and one large round trip per pair.
    async fn run_two_point(&self) -> Result<Option<RunOutput>> {
        let schedule = self.schedule();
        let mut local: HashMap<Pair, Sample> = HashMap::new();

        for pair in &schedule {
            if self.is_root() {
                self.logger
                    .debug(&format!("Ping {}, Pong {}", pair.ping, pair.pong))
                    .log();
            }

            let sample = probe::run_round(
                self.comm.as_ref(),
                *pair,
                self.config.small_bytes,
                self.config.large_bytes,
            )
            .await?;

            if let Some(sample) = sample {
                local.insert(*pair, sample);
            }

            // Round is atomic: nobody resolves the next pair until the
            // whole group has drained this one
            self.comm.barrier().await?;
        }

        // Star: the root initiated everything, no gather needed
        let merged = match self.scheme() {
            PairScheme::Star => {
                if self.is_root() {
                    Some(local)
                } else {
                    None
                }
            }
            PairScheme::FullMesh => {
                aggregate::gather_partials(self.comm.as_ref(), ROOT, &local).await?
            }
        };

        let Some(merged) = merged else {
            return Ok(None);
        };

        let result_set = aggregate::build_result_set(
            self.run_id.clone(),
            self.scheme(),
            self.group_size(),
            &schedule,
            &merged,
            self.config.small_bytes,
            self.config.large_bytes,
        )?;

        result_set.write_to(&self.config.output)?;
        self.logger
            .info(&format!(
                "wrote {} pair measurements to {}",
                result_set.len(),
                self.config.output
            ))
            .field("invalid_fits", result_set.invalid_count())
            .log();

        Ok(Some(RunOutput {
            result_set,
            multi_fits: None,
        }))
    }

    /// Multi-size mode with the default comm-backed probe is wired up by
    /// [`run`]; this entry point accepts any probe implementation.
    pub async fn run_multi_size(&self, probe: &dyn PairProbe) -> Result<Option<RunOutput>> {
        let schedule = self.schedule();
        let sizes = self.config.message_sizes_bytes();
        let mut local: HashMap<Pair, SampleMatrix> = HashMap::new();

        self.comm.barrier().await?;
        for pair in &schedule {
            if self.is_root() {
                self.logger
                    .debug(&format!("Ping {}, Pong {}", pair.ping, pair.pong))
                    .log();
            }

            // The probe broadcasts the matrix, so every rank records it
            let matrix = probe
                .probe(pair.ping, pair.pong, &sizes, self.config.repeats)
                .await?;
            local.insert(*pair, matrix);

            self.comm.barrier().await?;
        }

        if !self.is_root() {
            return Ok(None);
        }

        let (result_set, fits) = aggregate::build_result_set_multi(
            self.run_id.clone(),
            self.scheme(),
            self.group_size(),
            &schedule,
            &local,
        )?;

        result_set.write_to(&self.config.output)?;

        let detailed = DetailedResults {
            sizes_bytes: sizes,
            repeats: self.config.repeats,
            entries: schedule
                .iter()
                .map(|pair| (*pair, local[pair].clone()))
                .collect(),
        };
        detailed.write_to(self.config.detailed_output())?;

        self.logger
            .info(&format!(
                "wrote {} pair fits to {} (raw matrices in {})",
                result_set.len(),
                self.config.output,
                self.config.detailed_output()
            ))
            .log();

        Ok(Some(RunOutput {
            result_set,
            multi_fits: Some(fits),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::LocalGroup;
    use std::time::Duration;

    fn test_config(participants: usize, dir: &tempfile::TempDir) -> RunConfig {
        RunConfig {
            participants,
            small_bytes: 64,
            large_bytes: 8192,
            output: dir
                .path()
                .join("results.bin")
                .to_string_lossy()
                .into_owned(),
            ..Default::default()
        }
    }

    async fn run_group(config: RunConfig) -> Vec<Option<RunOutput>> {
        let endpoints =
            LocalGroup::create(config.participants, Duration::from_secs(10)).unwrap();
        let run_id = Logger::new_run_id();

        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|ep| {
                let config = config.clone();
                let run_id = run_id.clone();
                tokio::spawn(async move {
                    let ctx = RunContext::new(Arc::new(ep), config, run_id).unwrap();
                    ctx.run().await
                })
            })
            .collect();

        let mut outputs = Vec::new();
        for handle in handles {
            outputs.push(handle.await.unwrap().unwrap());
        }
        outputs
    }

    #[test]
    fn test_serial_group_fails_fast() {
        let endpoints = LocalGroup::create(1, Duration::from_secs(1)).unwrap();
        let ep = endpoints.into_iter().next().unwrap();
        let err = RunContext::new(
            Arc::new(ep),
            RunConfig::default(),
            "test".into(),
        )
        .unwrap_err();
        assert_eq!(err.category(), "GROUP_SIZE");
    }

    #[tokio::test]
    async fn test_two_point_run_with_three_participants() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(3, &dir);
        let output_path = config.output.clone();

        let outputs = run_group(config).await;

        let root_output = outputs[0].as_ref().expect("root produces the result set");
        assert!(outputs[1].is_none());
        assert!(outputs[2].is_none());

        let rs = &root_output.result_set;
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.scheme, PairScheme::FullMesh);
        assert_eq!(
            rs.pairs,
            vec![Pair::new(0, 1), Pair::new(0, 2), Pair::new(1, 2)]
        );

        // Parallel sequences landed on disk
        let (latencies, rates) = ResultSet::read_parallel(&output_path).unwrap();
        assert_eq!(latencies.len(), 3);
        assert_eq!(rates.len(), 3);
    }

    #[tokio::test]
    async fn test_multi_size_run_writes_detailed_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(2, &dir);
        config.mode = RunMode::MultiSize;
        config.size_blocks = vec![1, 2, 4];
        config.repeats = 3;
        let detailed_path = config.detailed_output();

        let outputs = run_group(config).await;

        let root_output = outputs[0].as_ref().unwrap();
        assert_eq!(root_output.result_set.len(), 1);
        let fits = root_output.multi_fits.as_ref().unwrap();
        assert_eq!(fits.len(), 1);

        let detailed = DetailedResults::read_from(&detailed_path).unwrap();
        assert_eq!(detailed.repeats, 3);
        assert_eq!(detailed.sizes_bytes, vec![1024, 2048, 4096]);
        assert_eq!(detailed.entries.len(), 1);
        detailed.entries[0].1.validate().unwrap();
    }
}
