//! Group-communication seam
//!
//! The benchmark core only talks to the group runtime through the
//! [`GroupComm`] trait: stable rank/size queries, directed tagged
//! send/receive with blocking semantics, a full-group barrier, a
//! gather-to-root collective, and a broadcast. Any runtime satisfying
//! this contract can carry the protocol; [`local::LocalGroup`] is the
//! in-process implementation used by the binary and the tests.

pub mod local;

pub use local::LocalGroup;

use crate::error::Result;
use async_trait::async_trait;

/// Message tag disambiguating concurrent exchanges.
///
/// Round payloads use the low tag space (`10/20/30/40 * rank`, so at most
/// `40 * N`); collective plumbing uses the reserved ranges below so that
/// in-flight round traffic can never be mistaken for gather or broadcast
/// frames.
pub type Tag = u64;

/// Base tag for gather-to-root frames; the sender's rank is added
pub const GATHER_TAG_BASE: Tag = 1 << 20;

/// Base tag for broadcast frames; the root's rank is added
pub const BCAST_TAG_BASE: Tag = 1 << 21;

/// Point-to-point and collective operations provided by the group runtime.
///
/// Sends and receives block (asynchronously) until matched; the barrier
/// blocks until every participant has arrived. Implementations bound
/// every wait by the configured timeout — a purely blocking rendition
/// would reproduce the reference behavior where one lost participant
/// freezes the whole group without a diagnostic.
#[async_trait]
pub trait GroupComm: Send + Sync {
    /// This participant's rank (0-based, unique, contiguous)
    fn rank(&self) -> usize;

    /// Total number of participants in the group
    fn size(&self) -> usize;

    /// Send `payload` to `dest` under `tag`
    async fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()>;

    /// Receive the next payload from `source` carrying `tag`
    async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>>;

    /// Block until every participant in the group has arrived
    async fn barrier(&self) -> Result<()>;

    /// Gather every participant's payload at `root`.
    ///
    /// Returns `Some(payloads)` in rank order on the root, `None` on
    /// every other participant.
    async fn gather(&self, root: usize, payload: Vec<u8>) -> Result<Option<Vec<Vec<u8>>>>;

    /// Distribute `payload` from `root` to the whole group; every
    /// participant (root included) returns the root's payload.
    async fn broadcast(&self, root: usize, payload: Vec<u8>) -> Result<Vec<u8>>;
}
