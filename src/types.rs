//! Core protocol types shared across the benchmark

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// An ordered combination of two distinct participant ranks.
///
/// `ping` initiates the timed exchange, `pong` echoes. For the full-mesh
/// scheme `ping < pong` always holds; for the star scheme `ping` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    /// Rank that initiates and times the exchange
    pub ping: usize,
    /// Rank that echoes payloads back
    pub pong: usize,
}

impl Pair {
    pub fn new(ping: usize, pong: usize) -> Self {
        Self { ping, pong }
    }

    /// Check structural validity against a group size: distinct ranks,
    /// both inside the group.
    pub fn is_valid(&self, group_size: usize) -> bool {
        self.ping != self.pong && self.ping < group_size && self.pong < group_size
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ping, self.pong)
    }
}

/// The part a participant plays in one round.
///
/// Exactly one participant is `Initiator` and one is `Responder` for any
/// pair; everyone else is a `Bystander` and only joins the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Starts and times the round-trip exchanges
    Initiator,
    /// Echoes payloads back without timing anything
    Responder,
    /// Not involved in the exchange; proceeds straight to the barrier
    Bystander,
}

impl Role {
    /// Resolve the role of rank `rank` for `pair`.
    ///
    /// Pure function: every participant derives the same answer for the
    /// same pair without any communication.
    pub fn resolve(rank: usize, pair: Pair) -> Self {
        if rank == pair.ping {
            Role::Initiator
        } else if rank == pair.pong {
            Role::Responder
        } else {
            Role::Bystander
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Initiator => "initiator",
            Role::Responder => "responder",
            Role::Bystander => "bystander",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group size maps onto the set of measured pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairScheme {
    /// All C(N,2) unordered pairs; affordable for modest groups
    FullMesh,
    /// N-1 pairs anchored at rank 0; linear cost for large groups
    Star,
}

impl PairScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairScheme::FullMesh => "full-mesh",
            PairScheme::Star => "star",
        }
    }
}

impl fmt::Display for PairScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which probe variant a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// One small and one large round trip per pair, two-point fit
    TwoPoint,
    /// Repeated round trips over a list of payload sizes, least-squares fit
    MultiSize,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::TwoPoint => "two-point",
            RunMode::MultiSize => "multi-size",
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "two-point" | "twopoint" => Ok(RunMode::TwoPoint),
            "multi-size" | "multisize" => Ok(RunMode::MultiSize),
            _ => Err(AppError::parse(format!("Invalid run mode: {}", s))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
