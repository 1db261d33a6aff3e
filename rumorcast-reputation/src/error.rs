//! Error type definitions for the reputation module.

use thiserror::Error;

/// The error type for operations on the reputation ledger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReputationError {
    /// The account has not been registered yet.
    #[error("unknown account")]
    UnknownAccount,
    /// `lockStake` preconditions (minimum, cap fraction, headroom) were not
    /// met; corresponds to error code E007.
    #[error("stake not permitted")]
    StakeNotPermitted,
    /// There is no lock under this action id to release.
    #[error("unknown lock")]
    UnknownLock,
}
