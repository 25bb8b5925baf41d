//! Transfer probe: the timed two-way exchange for a single pair
//!
//! The initiator times two full round trips (small payload, then large
//! payload); the responder echoes without ever starting a timer, so the
//! initiator's clock deliberately captures wire transfer plus responder
//! dispatch. Bystanders do nothing here and go straight to the barrier.
//!
//! Small and large exchanges use distinct tags in each direction (the
//! `10/20/30/40 * rank` discipline) so a send and its echo can never be
//! confused, nor payloads of one exchange mistaken for another's.

use crate::comm::{GroupComm, Tag};
use crate::error::{AppError, Result};
use crate::models::{Sample, SampleMatrix};
use crate::types::{Pair, Role};
use async_trait::async_trait;
use std::time::Instant;

/// Tag for the initiator's small payload
pub fn small_ping_tag(ping: usize) -> Tag {
    10 * ping as Tag
}

/// Tag for the responder's small echo
pub fn small_pong_tag(pong: usize) -> Tag {
    20 * pong as Tag
}

/// Tag for the initiator's large payload
pub fn large_ping_tag(ping: usize) -> Tag {
    30 * ping as Tag
}

/// Tag for the responder's large echo
pub fn large_pong_tag(pong: usize) -> Tag {
    40 * pong as Tag
}

/// Deterministic payload bytes for a rank.
///
/// Stands in for the reference's rank-seeded random arrays; deterministic
/// so an echo can be length- and content-checked cheaply.
pub fn payload_for(rank: usize, len: usize) -> Vec<u8> {
    let seed = (rank as u8).wrapping_mul(31).wrapping_add(17);
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

fn check_echo(pair: Pair, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(AppError::communication(format!(
            "pair {}: echo of {} bytes for a {}-byte payload",
            pair, got, expected
        )));
    }
    Ok(())
}

/// One timed round trip: send `payload` to `dest`, wait for the echo.
async fn timed_round_trip(
    comm: &dyn GroupComm,
    pair: Pair,
    send_tag: Tag,
    echo_tag: Tag,
    payload: Vec<u8>,
) -> Result<f64> {
    let len = payload.len();
    let start = Instant::now();
    comm.send(pair.pong, send_tag, payload).await?;
    let echo = comm.recv(pair.pong, echo_tag).await?;
    let elapsed = start.elapsed().as_secs_f64();
    check_echo(pair, len, echo.len())?;
    Ok(elapsed)
}

/// Echo one payload back to the initiator under `echo_tag`.
async fn echo_round_trip(
    comm: &dyn GroupComm,
    pair: Pair,
    recv_tag: Tag,
    echo_tag: Tag,
) -> Result<()> {
    let payload = comm.recv(pair.ping, recv_tag).await?;
    comm.send(pair.ping, echo_tag, payload).await
}

/// Execute one two-point round for this participant's role in `pair`.
///
/// Returns `Some(sample)` on the initiator, `None` on the responder and
/// on bystanders. The caller is responsible for the barrier that closes
/// the round.
pub async fn run_round(
    comm: &dyn GroupComm,
    pair: Pair,
    small_bytes: usize,
    large_bytes: usize,
) -> Result<Option<Sample>> {
    match Role::resolve(comm.rank(), pair) {
        Role::Initiator => {
            let t_small = timed_round_trip(
                comm,
                pair,
                small_ping_tag(pair.ping),
                small_pong_tag(pair.pong),
                payload_for(comm.rank(), small_bytes),
            )
            .await?;

            let t_large = timed_round_trip(
                comm,
                pair,
                large_ping_tag(pair.ping),
                large_pong_tag(pair.pong),
                payload_for(comm.rank(), large_bytes),
            )
            .await?;

            Ok(Some(Sample::new(t_small, t_large)))
        }
        Role::Responder => {
            echo_round_trip(comm, pair, small_ping_tag(pair.ping), small_pong_tag(pair.pong))
                .await?;
            echo_round_trip(comm, pair, large_ping_tag(pair.ping), large_pong_tag(pair.pong))
                .await?;
            Ok(None)
        }
        Role::Bystander => Ok(None),
    }
}

/// Capability for obtaining a full sample matrix for one pair.
///
/// Any implementation that returns round-trip timings for the given
/// sizes and repeats is acceptable; the protocol does not care how the
/// timings are physically obtained (an in-process exchange here, a
/// native helper in the reference).
#[async_trait]
pub trait PairProbe: Send + Sync {
    /// Probe `ping → pong` over `sizes_bytes`, timing each size
    /// `repeats` times. Every participant returns the same matrix; the
    /// initiator measures it and distributes it to the group.
    async fn probe(
        &self,
        ping: usize,
        pong: usize,
        sizes_bytes: &[usize],
        repeats: usize,
    ) -> Result<SampleMatrix>;
}

/// Multi-size probe built on the group-communication seam.
///
/// Loops the two-sided exchange over every size and repeat, then
/// broadcasts the finished matrix from the initiator so all ranks hold
/// the result, matching the reference helper's behavior.
pub struct CommPairProbe<'a> {
    comm: &'a dyn GroupComm,
}

impl<'a> CommPairProbe<'a> {
    pub fn new(comm: &'a dyn GroupComm) -> Self {
        Self { comm }
    }
}

#[async_trait]
impl<'a> PairProbe for CommPairProbe<'a> {
    async fn probe(
        &self,
        ping: usize,
        pong: usize,
        sizes_bytes: &[usize],
        repeats: usize,
    ) -> Result<SampleMatrix> {
        let pair = Pair::new(ping, pong);
        let rank = self.comm.rank();
        let mut matrix = SampleMatrix::new(sizes_bytes.to_vec(), repeats);

        match Role::resolve(rank, pair) {
            Role::Initiator => {
                for &size in sizes_bytes {
                    let mut row = Vec::with_capacity(repeats);
                    for _ in 0..repeats {
                        let elapsed = timed_round_trip(
                            self.comm,
                            pair,
                            small_ping_tag(pair.ping),
                            small_pong_tag(pair.pong),
                            payload_for(rank, size),
                        )
                        .await?;
                        row.push(elapsed);
                    }
                    matrix.timings.push(row);
                }
            }
            Role::Responder => {
                for _ in 0..sizes_bytes.len() * repeats {
                    echo_round_trip(
                        self.comm,
                        pair,
                        small_ping_tag(pair.ping),
                        small_pong_tag(pair.pong),
                    )
                    .await?;
                }
            }
            Role::Bystander => {}
        }

        // Initiator distributes the finished matrix to the whole group
        let encoded = if rank == ping {
            matrix.validate()?;
            bincode::serialize(&matrix)?
        } else {
            Vec::new()
        };
        let shared = self.comm.broadcast(ping, encoded).await?;
        let matrix: SampleMatrix = bincode::deserialize(&shared)?;
        matrix.validate()?;
        Ok(matrix)
    }
}
