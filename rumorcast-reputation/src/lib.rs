//! Reputation ledger: stakes, rewards, slashes, decay, recovery (§4.G).
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

/// Module containing error definitions.
pub mod error;
pub mod ledger;

pub use error::ReputationError;
pub use ledger::{Action, AppliedScores, HistoryEntry, HistoryKind, LockedStake, ReputationLedger};
