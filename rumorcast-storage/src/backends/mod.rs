//! # Storage backends
//!
//! These modules implement the `Storage` trait for a struct holding state for
//! a specific storage solution (in this workspace: volatile memory only — a
//! host wanting durable storage plugs in its own backend behind the same
//! trait).

pub mod hashmap;
