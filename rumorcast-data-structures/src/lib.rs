//! Data model, gossip envelope validation, operation log and materialized
//! view (§3, §4.A-4.D).
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod dedup;
pub mod envelope;
pub mod error;
pub mod identifiers;
pub mod identity;
pub mod log;
pub mod op;
pub mod rumor;
pub mod tombstone;
pub mod tombstone_authority;
pub mod vote;
pub mod view;

pub use dedup::NullifierSeenSet;
pub use envelope::validate;
pub use error::{EnvelopeError, TombstoneAuthorityError};
pub use identifiers::{Commitment, Nullifier, NullifierScope, RumorId};
pub use log::OperationLog;
pub use op::{Join, LogEntry, Operation};
pub use rumor::{Rumor, Topic};
pub use tombstone::{Tombstone, TombstoneReason};
pub use tombstone_authority::TombstoneAuthority;
pub use vote::{Choice, Prediction, Vote};
pub use view::{MaterializedView, NullSnapshotSink, Snapshot, SnapshotSink, ViewState};
