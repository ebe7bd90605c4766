//! Process-group handle
//!
//! Identity and collective operations for a fixed set of cooperating
//! processes running the same suite in lockstep.

mod solo;
mod tcp;

pub use solo::SoloGroup;
pub use tcp::TcpGroup;

use thiserror::Error;

/// Errors raised by the collective primitives.
///
/// These are never converted into test outcomes: a partial collective
/// failure cannot be recovered group-wide, so callers abort the run.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("i/o failure during collective: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not reach group leader at {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("collective protocol violation: expected {expected}, got {got}")]
    Protocol { expected: String, got: String },

    #[error("malformed collective frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("group state lock poisoned by an earlier panic")]
    Poisoned,

    #[error("invalid group configuration: {0}")]
    Config(String),
}

/// A fixed-size group of cooperating processes.
///
/// `rank` and `size` are stable for the life of the process. `barrier` and
/// `sum_all` are collective operations: every member must call them the same
/// number of times, in the same order. Mismatched call counts are a caller
/// error and may hang the group or surface as a protocol violation.
pub trait ProcessGroup {
    /// Identity of this process, `0 <= rank < size`.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Block until every member of the group has reached the same call.
    fn barrier(&self) -> Result<(), GroupError>;

    /// Collective reduction: every member supplies a local value and every
    /// member receives the group-wide sum.
    fn sum_all(&self, local: i64) -> Result<i64, GroupError>;

    /// Rank 0 owns all human-readable output.
    fn is_leader(&self) -> bool {
        self.rank() == 0
    }
}
