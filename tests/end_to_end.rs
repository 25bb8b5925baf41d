//! End-to-end scenarios running the full protocol over the in-process
//! group runtime.

use async_trait::async_trait;
use pingpong_bench::comm::{GroupComm, LocalGroup, Tag};
use pingpong_bench::error::Result;
use pingpong_bench::logging::Logger;
use pingpong_bench::models::{ResultSet, RunConfig};
use pingpong_bench::runner::{RunContext, RunOutput};
use pingpong_bench::types::{Pair, PairScheme, Role, RunMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wrapper that counts barrier arrivals for one participant
struct CountingComm {
    inner: LocalGroup,
    barriers: Arc<AtomicUsize>,
}

#[async_trait]
impl GroupComm for CountingComm {
    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    async fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()> {
        self.inner.send(dest, tag, payload).await
    }

    async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>> {
        self.inner.recv(source, tag).await
    }

    async fn barrier(&self) -> Result<()> {
        self.barriers.fetch_add(1, Ordering::SeqCst);
        self.inner.barrier().await
    }

    async fn gather(&self, root: usize, payload: Vec<u8>) -> Result<Option<Vec<Vec<u8>>>> {
        self.inner.gather(root, payload).await
    }

    async fn broadcast(&self, root: usize, payload: Vec<u8>) -> Result<Vec<u8>> {
        self.inner.broadcast(root, payload).await
    }
}

fn quick_config(participants: usize, dir: &tempfile::TempDir) -> RunConfig {
    RunConfig {
        participants,
        small_bytes: 64,
        large_bytes: 4096,
        output: dir
            .path()
            .join("results.bin")
            .to_string_lossy()
            .into_owned(),
        ..Default::default()
    }
}

/// Run the whole group, returning the root's output and every
/// participant's barrier count.
async fn run_counted(config: RunConfig) -> (RunOutput, Vec<usize>) {
    let endpoints = LocalGroup::create(config.participants, Duration::from_secs(30)).unwrap();
    let run_id = Logger::new_run_id();

    let counters: Vec<Arc<AtomicUsize>> = (0..config.participants)
        .map(|_| Arc::new(AtomicUsize::new(0)))
        .collect();

    let handles: Vec<_> = endpoints
        .into_iter()
        .zip(counters.iter())
        .map(|(endpoint, counter)| {
            let comm = CountingComm {
                inner: endpoint,
                barriers: counter.clone(),
            };
            let config = config.clone();
            let run_id = run_id.clone();
            tokio::spawn(async move {
                let ctx = RunContext::new(Arc::new(comm), config, run_id).unwrap();
                ctx.run().await
            })
        })
        .collect();

    let mut root_output = None;
    for handle in handles {
        if let Some(out) = handle.await.unwrap().unwrap() {
            root_output = Some(out);
        }
    }

    let counts = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    (root_output.expect("root output"), counts)
}

#[tokio::test]
async fn full_mesh_of_four_measures_six_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config(4, &dir);
    let output_path = config.output.clone();

    let (output, barrier_counts) = run_counted(config).await;
    let rs = &output.result_set;

    // 6 pairs in the fixed deterministic order
    assert_eq!(rs.scheme, PairScheme::FullMesh);
    assert_eq!(
        rs.pairs,
        vec![
            Pair::new(0, 1),
            Pair::new(0, 2),
            Pair::new(0, 3),
            Pair::new(1, 2),
            Pair::new(1, 3),
            Pair::new(2, 3),
        ]
    );

    // Each round: exactly 2 active participants, 2 bystanders
    for pair in &rs.pairs {
        let bystanders = (0..4)
            .filter(|&r| Role::resolve(r, *pair) == Role::Bystander)
            .count();
        assert_eq!(bystanders, 2);
    }

    // All 4 participants reached the barrier exactly 6 times
    assert_eq!(barrier_counts, vec![6, 6, 6, 6]);

    // The persisted parallel sequences match the aggregated set
    let (latencies, rates) = ResultSet::read_parallel(&output_path).unwrap();
    let (expected_latencies, expected_rates) = rs.parallel_sequences();
    assert_eq!(latencies, expected_latencies);
    assert_eq!(rates, expected_rates);
}

#[tokio::test]
async fn star_of_forty_anchors_every_pair_at_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = quick_config(40, &dir);
    // Keep 40 simultaneous participants cheap
    config.small_bytes = 16;
    config.large_bytes = 256;

    let (output, barrier_counts) = run_counted(config).await;
    let rs = &output.result_set;

    assert_eq!(rs.scheme, PairScheme::Star);
    assert_eq!(rs.len(), 39);
    for (k, pair) in rs.pairs.iter().enumerate() {
        assert_eq!(*pair, Pair::new(0, k + 1));
        // Rank 0 initiates every round
        assert_eq!(Role::resolve(0, *pair), Role::Initiator);
    }

    // One barrier per round, on every participant
    assert!(barrier_counts.iter().all(|&c| c == 39));
}

#[tokio::test]
async fn multi_size_run_reports_three_fits_per_pair() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = quick_config(3, &dir);
    config.mode = RunMode::MultiSize;
    config.size_blocks = vec![1, 2, 4];
    config.repeats = 2;

    let (output, barrier_counts) = run_counted(config).await;
    let rs = &output.result_set;

    assert_eq!(rs.len(), 3);
    assert_eq!(rs.mode, RunMode::MultiSize);

    let fits = output.multi_fits.as_ref().expect("multi-size fits");
    assert_eq!(fits.len(), 3);
    for (pair, _fit) in fits {
        assert!(rs.pairs.contains(pair));
    }

    // Initial barrier plus one per round
    assert!(barrier_counts.iter().all(|&c| c == 4));
}
