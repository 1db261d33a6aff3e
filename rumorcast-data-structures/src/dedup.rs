//! Nullifier dedup tracking (I1).
//!
//! Separate from [`crate::envelope::validate`] because scope uniqueness is
//! stateful across the whole log, while validation is a pure function of one
//! envelope.
use std::collections::HashSet;

use crate::identifiers::NullifierScope;
use crate::op::Operation;

fn scope_of(op: &Operation) -> NullifierScope {
    match op {
        Operation::Join(_) => NullifierScope::OpType("join"),
        Operation::Rumor(_) => NullifierScope::OpType("rumor"),
        Operation::Tombstone(_) => NullifierScope::OpType("tombstone"),
        Operation::Vote(v) => NullifierScope::Vote(v.rumor_id.clone()),
    }
}

/// Tracks `(nullifier, scope)` pairs already admitted to the log, rejecting
/// any later op that repeats one (I1: "at most one accepted operation per
/// (nullifier, scope) pair").
#[derive(Debug, Default)]
pub struct NullifierSeenSet {
    seen: HashSet<(String, NullifierScope)>,
}

impl NullifierSeenSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// If `op`'s `(nullifier, scope)` has not been seen, record it and
    /// return `true`. Otherwise return `false` without mutating state.
    pub fn admit(&mut self, op: &Operation) -> bool {
        let key = (op.nullifier().0.clone(), scope_of(op));
        self.seen.insert(key)
    }

    /// Whether `op`'s `(nullifier, scope)` pair has already been admitted.
    pub fn contains(&self, op: &Operation) -> bool {
        let key = (op.nullifier().0.clone(), scope_of(op));
        self.seen.contains(&key)
    }

    /// Number of distinct `(nullifier, scope)` pairs admitted so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no pair has been admitted yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{Nullifier, RumorId};
    use crate::rumor::{Rumor, Topic};
    use crate::vote::{Choice, Prediction, Vote};

    fn rumor(nullifier: &str) -> Operation {
        Operation::Rumor(Rumor {
            id: RumorId("r1".into()),
            text: "hi".into(),
            topic: Topic::General,
            author_nullifier: Nullifier(nullifier.into()),
            timestamp: 0,
        })
    }

    fn vote(nullifier: &str, rumor_id: &str) -> Operation {
        Operation::Vote(Vote {
            rumor_id: RumorId(rumor_id.into()),
            voter_nullifier: Nullifier(nullifier.into()),
            choice: Choice::True,
            prediction: Prediction::new(0.9, 0.05, 0.05),
            stake_amount: 1,
            timestamp: 0,
        })
    }

    #[test]
    fn rejects_repeated_nullifier_same_scope() {
        let mut set = NullifierSeenSet::new();
        assert!(set.admit(&rumor("n1")));
        assert!(!set.admit(&rumor("n1")));
    }

    #[test]
    fn vote_scope_is_per_rumor() {
        let mut set = NullifierSeenSet::new();
        assert!(set.admit(&vote("n1", "r1")));
        // Same voter on a different rumor is a distinct scope.
        assert!(set.admit(&vote("n1", "r2")));
        // Same voter, same rumor: rejected.
        assert!(!set.admit(&vote("n1", "r1")));
    }
}
