//! Key/value persistence abstraction (§6 "Persistence interface").
//!
//! The core requires only atomic replace-whole-blob semantics per key; no
//! transactional multi-key guarantees are assumed. Concrete backends live in
//! [`backends`].
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

/// Error type for storage operations.
pub mod error;
/// Concrete `Storage` implementations.
pub mod backends;
/// The `Storage` trait and `WriteBatch` type.
pub mod storage;

pub use error::StorageError;
pub use storage::{Storage, StorageIterator, WriteBatch, WriteBatchItem};
