//! Tagged union of operations accepted into the log (§3, §4.B).
//!
//! Validation produces one of these variants directly; nothing downstream of
//! the validator branches on a `"type"` string.
use serde::{Deserialize, Serialize};

use crate::identifiers::{Commitment, Nullifier};
use crate::rumor::Rumor;
use crate::tombstone::Tombstone;
use crate::vote::Vote;

/// Member registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Join {
    /// Public commitment of the new member.
    pub commitment: Commitment,
    /// Nullifier admitting a reputation account.
    pub nullifier: Nullifier,
    /// Gossip-supplied timestamp.
    pub timestamp: i64,
}

/// One accepted operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// A new member joined.
    Join(Join),
    /// A new rumor was posted.
    Rumor(Rumor),
    /// A vote was cast.
    Vote(Vote),
    /// A rumor was logically deleted.
    Tombstone(Tombstone),
}

impl Operation {
    /// The nullifier carried by this operation (I1).
    pub fn nullifier(&self) -> &Nullifier {
        match self {
            Operation::Join(j) => &j.nullifier,
            Operation::Rumor(r) => &r.author_nullifier,
            Operation::Vote(v) => &v.voter_nullifier,
            Operation::Tombstone(t) => &t.author_nullifier,
        }
    }
}

/// One entry in the operation log: an accepted op plus bookkeeping assigned
/// at ingest time (§3 "Operation log entry").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The accepted operation.
    pub op: Operation,
    /// Monotonic position assigned by [`crate::log::OperationLog::append`].
    /// The sole ordering: no timestamp-based reordering.
    pub ingest_index: u64,
    /// Wall-clock time the node ingested (not gossiped) this op.
    pub ingested_at: i64,
}
