//! Rumorcast: an anonymous, gossip-replicated rumor-verification substrate.
//!
//! [`GossipNode`] wires together envelope validation, the operation log, the
//! materialized view, correlation dampening, BTS/RBTS scoring, the
//! reputation ledger and anti-entropy sync into one cooperative,
//! single-threaded facade (§2, §5).
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod error;
pub mod node;

pub use error::NodeError;
pub use node::GossipNode;
