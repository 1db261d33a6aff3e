//! Tombstone entity (§3 Data Model, §4.D Tombstone Authority).
use serde::{Deserialize, Serialize};

use crate::identifiers::{Nullifier, RumorId};

/// Why a rumor was logically deleted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TombstoneReason {
    /// The author retracted it.
    Retracted,
    /// It duplicates another rumor.
    Duplicate,
    /// The community flagged it.
    CommunityFlagged,
    /// An administrator removed it.
    AdminRemoval,
}

/// An absorbing logical-delete operation for the referenced rumor (I2).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tombstone {
    /// The rumor being tombstoned.
    pub rumor_id: RumorId,
    /// Why.
    pub reason: TombstoneReason,
    /// Nullifier of whoever requested the tombstone.
    pub author_nullifier: Nullifier,
    /// Gossip-supplied timestamp.
    pub timestamp: i64,
}
