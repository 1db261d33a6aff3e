//! Anti-entropy Merkle synchronization between nodes (§4.I).
#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod store;
pub mod sync;
pub mod wire;

pub use store::{EntryStore, StoreKey};
pub use sync::{AntiEntropyEngine, PeerId, SyncRequest, SyncResponse, SyncStats};
pub use wire::{encode_sync_request, encode_sync_response, parse_sync_request, parse_sync_response, SyncWireError};
