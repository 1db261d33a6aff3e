//! Opaque identifier types (§3 Data Model).
use std::fmt;

use serde::{Deserialize, Serialize};

/// Public anonymous fingerprint of a member. Opaque: the core never inspects
/// its bytes, only compares and stores it.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Commitment(pub String);

/// Per-(member, scope) unforgeable identifier used to prevent double-action
/// without linking back to a member (I1).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub String);

/// Content-addressed identifier of a rumor.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RumorId(pub String);

macro_rules! display_as_inner {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

display_as_inner!(Commitment);
display_as_inner!(Nullifier);
display_as_inner!(RumorId);

/// The scope a nullifier must be unique within (I1): `op.type` for
/// non-votes, `(RumorId, "vote")` for votes.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NullifierScope {
    /// Non-vote operation type: `join`, `rumor` or `tombstone`.
    OpType(&'static str),
    /// One vote per (rumor, voter) pair.
    Vote(RumorId),
}
