//! Anti-Entropy Sync cycle (§4.I).
use std::collections::BTreeMap;

use log::{debug, trace};

use rumorcast_config::Config;
use rumorcast_crypto::hash::Sha256;

use crate::store::{EntryStore, StoreKey};

/// A peer identifier; opaque to this crate.
pub type PeerId = String;

/// `SYNC_REQUEST` payload: the sender's current root per store (§6
/// `/sync/1.0`).
#[derive(Clone, Debug, PartialEq)]
pub struct SyncRequest {
    /// Root hash per store, hex-encoded on the wire.
    pub roots: BTreeMap<StoreKey, Sha256>,
}

/// `SYNC_RESPONSE` payload: for each store where roots differed, the
/// entries the requester doesn't have yet (bounded by `max_sync_batch_size`).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SyncResponse {
    /// Canonical-serialized entries to insert, per store.
    pub entries: BTreeMap<StoreKey, Vec<Vec<u8>>>,
}

/// Running counters for one node's sync activity (§4.I "Statistics kept").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncStats {
    /// Total sync cycles initiated.
    pub sync_count: u64,
    /// Total entries received via read-repair, across all peers.
    pub entries_received: u64,
    /// Total entries sent in responses, across all peers.
    pub entries_sent: u64,
    /// Wall-clock time of the last completed exchange, per peer.
    pub last_sync_at: BTreeMap<PeerId, i64>,
}

/// Coordinates anti-entropy sync across the four stores for one node.
pub struct AntiEntropyEngine {
    stores: BTreeMap<StoreKey, EntryStore>,
    stats: SyncStats,
    cooldown_secs: u64,
    max_batch_size: usize,
}

impl AntiEntropyEngine {
    /// A fresh engine with empty stores, configured from `config`.
    pub fn new(config: &Config) -> Self {
        let mut stores = BTreeMap::new();
        for key in StoreKey::ALL {
            stores.insert(key, EntryStore::new());
        }
        AntiEntropyEngine {
            stores,
            stats: SyncStats::default(),
            cooldown_secs: config.sync_cooldown_secs,
            max_batch_size: config.max_sync_batch_size,
        }
    }

    /// Mutable access to one store, e.g. to insert a freshly accepted op's
    /// canonical bytes as it's ingested.
    pub fn store_mut(&mut self, key: StoreKey) -> &mut EntryStore {
        self.stores.entry(key).or_default()
    }

    /// Read-only access to one store.
    pub fn store(&self, key: StoreKey) -> Option<&EntryStore> {
        self.stores.get(&key)
    }

    /// Current statistics.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Build a `SYNC_REQUEST` carrying this node's current roots, or `None`
    /// if `peer` was synced with more recently than `cooldown_secs` ago
    /// (§4.I step 1).
    pub fn issue_request(&mut self, peer: &PeerId, now: i64) -> Option<SyncRequest> {
        if let Some(&last) = self.stats.last_sync_at.get(peer) {
            if now - last < self.cooldown_secs as i64 {
                trace!("sync with {peer} skipped: cooldown active");
                return None;
            }
        }
        self.stats.sync_count += 1;
        Some(SyncRequest {
            roots: self.stores.iter().map(|(k, s)| (*k, s.root())).collect(),
        })
    }

    /// Build a `SYNC_RESPONSE` for a received `request`: for every store
    /// whose root differs (or is absent) from ours, include up to
    /// `max_sync_batch_size` local entries (§4.I step 2).
    pub fn build_response(&self, request: &SyncRequest) -> SyncResponse {
        let mut entries = BTreeMap::new();
        for key in StoreKey::ALL {
            let store = match self.stores.get(&key) {
                Some(s) => s,
                None => continue,
            };
            let peer_root = request.roots.get(&key).copied();
            if peer_root == Some(store.root()) {
                continue;
            }
            let batch = store.entries_up_to(self.max_batch_size);
            if !batch.is_empty() {
                entries.insert(key, batch);
            }
        }
        entries
    }

    /// Apply a received `SYNC_RESPONSE`: for each returned batch, insert
    /// entries not already known (read-repair), then update statistics for
    /// `peer` (§4.I step 3). Returns the number of entries actually
    /// inserted.
    pub fn apply_response(&mut self, peer: &PeerId, response: &SyncResponse, now: i64) -> usize {
        let mut inserted = 0;
        for (key, batch) in &response.entries {
            let store = self.stores.entry(*key).or_default();
            for entry in batch {
                if store.insert(entry.clone()) {
                    inserted += 1;
                }
            }
        }
        self.stats.entries_received += inserted as u64;
        self.stats.last_sync_at.insert(peer.clone(), now);
        debug!("sync with {peer} read-repaired {inserted} entries");
        inserted
    }

    /// Record that `count` entries were sent to a peer in a response built
    /// by [`build_response`](Self::build_response), for statistics.
    pub fn record_sent(&mut self, count: usize) {
        self.stats.entries_sent += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn cooldown_blocks_repeat_request() {
        let mut engine = AntiEntropyEngine::new(&cfg());
        let peer = "peer-1".to_string();
        assert!(engine.issue_request(&peer, 0).is_some());
        engine.stats.last_sync_at.insert(peer.clone(), 0);
        assert!(engine.issue_request(&peer, 10).is_none());
        assert!(engine.issue_request(&peer, 31).is_some());
    }

    #[test]
    fn build_response_skips_matching_roots() {
        let mut a = AntiEntropyEngine::new(&cfg());
        a.store_mut(StoreKey::Rumors).insert(b"r1".to_vec());
        let mut b = AntiEntropyEngine::new(&cfg());
        b.store_mut(StoreKey::Rumors).insert(b"r1".to_vec());

        let request = SyncRequest {
            roots: StoreKey::ALL.iter().map(|k| (*k, b.store(*k).unwrap().root())).collect(),
        };
        let response = a.build_response(&request);
        assert!(response.entries.is_empty());
    }

    #[test]
    fn build_response_includes_divergent_store_entries() {
        let mut a = AntiEntropyEngine::new(&cfg());
        a.store_mut(StoreKey::Rumors).insert(b"r1".to_vec());
        a.store_mut(StoreKey::Rumors).insert(b"r2".to_vec());
        let b = AntiEntropyEngine::new(&cfg());

        let request = SyncRequest {
            roots: StoreKey::ALL.iter().map(|k| (*k, b.store(*k).unwrap().root())).collect(),
        };
        let response = a.build_response(&request);
        assert_eq!(response.entries[&StoreKey::Rumors].len(), 2);
    }

    #[test]
    fn apply_response_read_repairs_new_entries_only() {
        let mut b = AntiEntropyEngine::new(&cfg());
        b.store_mut(StoreKey::Rumors).insert(b"r1".to_vec());

        let mut response = SyncResponse::default();
        response.entries.insert(StoreKey::Rumors, vec![b"r1".to_vec(), b"r2".to_vec()]);

        let inserted = b.apply_response(&"peer-1".to_string(), &response, 100);
        assert_eq!(inserted, 1);
        assert_eq!(b.store(StoreKey::Rumors).unwrap().len(), 2);
        assert_eq!(b.stats().entries_received, 1);
        assert_eq!(b.stats().last_sync_at[&"peer-1".to_string()], 100);
    }

    #[test]
    fn roots_converge_after_one_cycle() {
        let mut a = AntiEntropyEngine::new(&cfg());
        a.store_mut(StoreKey::Votes).insert(b"v1".to_vec());
        a.store_mut(StoreKey::Votes).insert(b"v2".to_vec());
        let mut b = AntiEntropyEngine::new(&cfg());
        b.store_mut(StoreKey::Votes).insert(b"v2".to_vec());

        let request = b.issue_request(&"a".to_string(), 0).unwrap();
        let response = a.build_response(&request);
        b.apply_response(&"a".to_string(), &response, 0);

        assert_eq!(a.store(StoreKey::Votes).unwrap().root(), b.store(StoreKey::Votes).unwrap().root());
    }
}
