//! Tombstone Authority (§4.D).
//!
//! Constructs valid [`Tombstone`] operations; does not itself gossip or
//! apply them. Rumor authorship is registered out-of-band by the host on
//! RUMOR ingest, since the authority has no other way to learn it.
use std::collections::HashMap;

use crate::error::TombstoneAuthorityError;
use crate::identifiers::{Nullifier, RumorId};
use crate::tombstone::{Tombstone, TombstoneReason};

/// Default reason used by [`TombstoneAuthority::create_administrative`].
const DEFAULT_ADMIN_REASON: TombstoneReason = TombstoneReason::AdminRemoval;

/// Tracks rumor authorship and tombstone state needed to admit new
/// TOMBSTONE ops.
#[derive(Debug, Default)]
pub struct TombstoneAuthority {
    authors: HashMap<RumorId, Nullifier>,
    tombstoned: std::collections::HashSet<RumorId>,
}

impl TombstoneAuthority {
    /// An authority with no known rumors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `rumor_id` was authored by `author_nullifier`. Called by
    /// the host on every accepted RUMOR op.
    pub fn register_rumor(&mut self, rumor_id: RumorId, author_nullifier: Nullifier) {
        self.authors.insert(rumor_id, author_nullifier);
    }

    /// Record that `rumor_id` has been tombstoned, e.g. after observing an
    /// accepted TOMBSTONE op (possibly one this authority did not itself
    /// create).
    pub fn mark_tombstoned(&mut self, rumor_id: RumorId) {
        self.tombstoned.insert(rumor_id);
    }

    /// Build a TOMBSTONE op authored by `author_nullifier`, rejecting if the
    /// rumor is unknown, already tombstoned, or authored by someone else.
    pub fn create(
        &self,
        rumor_id: RumorId,
        author_nullifier: Nullifier,
        reason: TombstoneReason,
        timestamp: i64,
    ) -> Result<Tombstone, TombstoneAuthorityError> {
        let registered = self
            .authors
            .get(&rumor_id)
            .ok_or(TombstoneAuthorityError::UnknownTarget)?;
        if self.tombstoned.contains(&rumor_id) {
            return Err(TombstoneAuthorityError::AlreadyTombstoned);
        }
        if *registered != author_nullifier {
            return Err(TombstoneAuthorityError::AuthorMismatch);
        }
        Ok(Tombstone {
            rumor_id,
            reason,
            author_nullifier,
            timestamp,
        })
    }

    /// Build a TOMBSTONE op bypassing author match, for administrative
    /// removal. The caller's admin authority is an external concern; this
    /// only constructs a syntactically valid op.
    pub fn create_administrative(
        &self,
        rumor_id: RumorId,
        reason: Option<TombstoneReason>,
        admin_nullifier: Nullifier,
        timestamp: i64,
    ) -> Result<Tombstone, TombstoneAuthorityError> {
        if !self.authors.contains_key(&rumor_id) {
            return Err(TombstoneAuthorityError::UnknownTarget);
        }
        if self.tombstoned.contains(&rumor_id) {
            return Err(TombstoneAuthorityError::AlreadyTombstoned);
        }
        Ok(Tombstone {
            rumor_id,
            reason: reason.unwrap_or(DEFAULT_ADMIN_REASON),
            author_nullifier: admin_nullifier,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority_with(rumor_id: &str, author: &str) -> TombstoneAuthority {
        let mut a = TombstoneAuthority::new();
        a.register_rumor(RumorId(rumor_id.into()), Nullifier(author.into()));
        a
    }

    #[test]
    fn rejects_unknown_rumor() {
        let a = TombstoneAuthority::new();
        let err = a
            .create(RumorId("r1".into()), Nullifier("n1".into()), TombstoneReason::Retracted, 0)
            .unwrap_err();
        assert_eq!(err, TombstoneAuthorityError::UnknownTarget);
    }

    #[test]
    fn rejects_author_mismatch() {
        let a = authority_with("r1", "n1");
        let err = a
            .create(RumorId("r1".into()), Nullifier("n2".into()), TombstoneReason::Retracted, 0)
            .unwrap_err();
        assert_eq!(err, TombstoneAuthorityError::AuthorMismatch);
    }

    #[test]
    fn accepts_matching_author_and_rejects_second_attempt() {
        let mut a = authority_with("r1", "n1");
        let t = a
            .create(RumorId("r1".into()), Nullifier("n1".into()), TombstoneReason::Retracted, 5)
            .unwrap();
        assert_eq!(t.reason, TombstoneReason::Retracted);

        a.mark_tombstoned(RumorId("r1".into()));
        let err = a
            .create(RumorId("r1".into()), Nullifier("n1".into()), TombstoneReason::Retracted, 6)
            .unwrap_err();
        assert_eq!(err, TombstoneAuthorityError::AlreadyTombstoned);
    }

    #[test]
    fn administrative_bypasses_author_match() {
        let a = authority_with("r1", "n1");
        let t = a
            .create_administrative(RumorId("r1".into()), None, Nullifier("admin".into()), 0)
            .unwrap();
        assert_eq!(t.reason, TombstoneReason::AdminRemoval);
        assert_eq!(t.author_nullifier, Nullifier("admin".into()));
    }
}
