//! Error type definitions for the data structures module.
use thiserror::Error;

/// Envelope/validator rejection reasons (§4.A, §6 error codes).
///
/// These are returned from [`crate::envelope::validate`] for local-API
/// callers; on the gossip path a caller simply drops the envelope on any
/// `Err` (§7 "Malformed input ... drop silently on gossip").
#[derive(Debug, Error, PartialEq)]
pub enum EnvelopeError {
    /// The envelope bytes are not valid UTF-8 JSON, or are missing a
    /// required top-level field (`type`, `version`, `payload`). Error code
    /// E014.
    #[error("envelope schema failure: {0}")]
    SchemaInvalid(String),
    /// `serialized_size > MAX_MESSAGE_SIZE`. Error code E012.
    #[error("message too large: {size} bytes > {limit} bytes")]
    MessageTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// The configured limit.
        limit: usize,
    },
    /// Unsupported envelope `version`.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(String),
    /// A required payload field is missing. Error code E100.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// An enum-valued field did not match any known variant. Error code
    /// E100.
    #[error("invalid enum value for {field}: {value}")]
    InvalidEnumValue {
        /// Field name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
    /// Rumor text exceeds `max_rumor_text_len`.
    #[error("rumor text too long: {len} > {limit}")]
    TextTooLong {
        /// Actual length.
        len: usize,
        /// The configured limit.
        limit: usize,
    },
    /// `|sum(prediction) - 1.0| > tolerance`, violating I3.
    #[error("prediction does not sum to 1.0 +/- tolerance: got {sum}")]
    PredictionSumOutOfTolerance {
        /// The computed sum.
        sum: f64,
    },
    /// A missing DKIM domain on a JOIN payload. Error code E003.
    #[error("missing DKIM domain")]
    MissingDkimDomain,
}

/// Tombstone Authority rejection reasons (§4.D). Error codes E200-E206.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TombstoneAuthorityError {
    /// No rumor with this id is known.
    #[error("unknown target")]
    UnknownTarget,
    /// The rumor is already tombstoned.
    #[error("already tombstoned")]
    AlreadyTombstoned,
    /// `authorNullifier` did not match the rumor's registered author.
    #[error("author mismatch")]
    AuthorMismatch,
}
