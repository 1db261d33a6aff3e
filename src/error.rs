//! Error type for the [`crate::GossipNode`] facade.
use thiserror::Error;

use rumorcast_data_structures::{EnvelopeError, TombstoneAuthorityError};
use rumorcast_reputation::ReputationError;

/// Everything that can go wrong while a [`crate::GossipNode`] handles one
/// envelope or host call.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The envelope failed schema or field validation (§4.A). On the gossip
    /// path a caller should drop silently instead of propagating this; it is
    /// surfaced here for local-API callers and tests (§7).
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    /// The envelope's `(nullifier, scope)` pair was already admitted (I1).
    #[error("duplicate nullifier for this scope")]
    DuplicateNullifier,
    /// A tombstone request was rejected by the authority (§4.D).
    #[error(transparent)]
    Tombstone(#[from] TombstoneAuthorityError),
    /// A reputation ledger operation failed (§4.G).
    #[error(transparent)]
    Reputation(#[from] ReputationError),
}
