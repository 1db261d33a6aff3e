//! Rumor entity (§3 Data Model).
use serde::{Deserialize, Serialize};

use crate::identifiers::{Nullifier, RumorId};

/// Topic a rumor is filed under.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// University/organization administration.
    Administration,
    /// Campus safety.
    Safety,
    /// Events and happenings.
    Events,
    /// Academic matters.
    Academic,
    /// Physical facilities.
    Facilities,
    /// Anything else.
    General,
}

/// A rumor: created once by a RUMOR op, never mutated, possibly later
/// superseded by a TOMBSTONE.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rumor {
    /// Content-addressed id.
    pub id: RumorId,
    /// Body text, at most `max_rumor_text_len` chars.
    pub text: String,
    /// Topic classification.
    pub topic: Topic,
    /// Nullifier of the author.
    pub author_nullifier: Nullifier,
    /// Gossip-supplied timestamp (not used for ordering; see §3 "Operation
    /// log entry").
    pub timestamp: i64,
}
