//! Per-store entry tracking and Merkle root maintenance (§4.I).
use std::collections::BTreeMap;

use rumorcast_crypto::hash::Sha256;
use rumorcast_crypto::merkle::{leaf_hash, merkle_root};

/// The four sync-eligible stores named in the wire format (§6 `/sync/1.0`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StoreKey {
    /// Rumor entries.
    Rumors,
    /// Vote entries.
    Votes,
    /// Identity (JOIN) entries.
    Identities,
    /// Reputation history entries.
    Reputation,
}

impl StoreKey {
    /// All four store keys, in a fixed order.
    pub const ALL: [StoreKey; 4] = [
        StoreKey::Rumors,
        StoreKey::Votes,
        StoreKey::Identities,
        StoreKey::Reputation,
    ];

    /// The wire name used as a JSON map key (§6).
    pub fn wire_name(self) -> &'static str {
        match self {
            StoreKey::Rumors => "rumors",
            StoreKey::Votes => "votes",
            StoreKey::Identities => "identities",
            StoreKey::Reputation => "reputation",
        }
    }

    /// Parse a wire name back into a [`StoreKey`].
    pub fn from_wire_name(name: &str) -> Option<Self> {
        StoreKey::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

/// Content-addressed entries for one store. The Merkle root is a pure
/// function of the *set* of entries: leaves are ordered by hash, not by
/// insertion time, so two stores holding the same entries in different
/// orders converge to the same root.
#[derive(Debug, Default, Clone)]
pub struct EntryStore {
    entries: BTreeMap<Sha256, Vec<u8>>,
}

impl EntryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `canonical_bytes` if its leaf hash is not already present.
    /// Returns `true` if it was newly inserted.
    pub fn insert(&mut self, canonical_bytes: Vec<u8>) -> bool {
        let hash = leaf_hash(&canonical_bytes);
        if self.entries.contains_key(&hash) {
            return false;
        }
        self.entries.insert(hash, canonical_bytes);
        true
    }

    /// Whether an entry with this leaf hash is already present.
    pub fn contains(&self, hash: &Sha256) -> bool {
        self.entries.contains_key(hash)
    }

    /// The current Merkle root (`EMPTY_SHA256` when the store has no
    /// entries, §4.I).
    pub fn root(&self) -> Sha256 {
        let leaves: Vec<Sha256> = self.entries.keys().copied().collect();
        merkle_root(&leaves)
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in canonical (hash) order, up to `limit`.
    pub fn entries_up_to(&self, limit: usize) -> Vec<Vec<u8>> {
        self.entries.values().take(limit).cloned().collect()
    }

    /// All entries whose leaf hash is not in `known`, up to `limit` (used
    /// to build a sync response containing only what the peer is missing).
    pub fn entries_missing_from(&self, known: &[Sha256], limit: usize) -> Vec<Vec<u8>> {
        let known: std::collections::BTreeSet<&Sha256> = known.iter().collect();
        self.entries
            .iter()
            .filter(|(hash, _)| !known.contains(hash))
            .map(|(_, bytes)| bytes.clone())
            .take(limit)
            .collect()
    }

    /// All leaf hashes currently held, in canonical order.
    pub fn known_hashes(&self) -> Vec<Sha256> {
        self.entries.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_empty_root() {
        let store = EntryStore::new();
        assert_eq!(store.root(), rumorcast_crypto::hash::EMPTY_SHA256);
    }

    #[test]
    fn insert_is_idempotent_by_content() {
        let mut store = EntryStore::new();
        assert!(store.insert(b"entry-a".to_vec()));
        assert!(!store.insert(b"entry-a".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn root_is_independent_of_insertion_order() {
        let mut a = EntryStore::new();
        a.insert(b"x".to_vec());
        a.insert(b"y".to_vec());
        a.insert(b"z".to_vec());

        let mut b = EntryStore::new();
        b.insert(b"z".to_vec());
        b.insert(b"x".to_vec());
        b.insert(b"y".to_vec());

        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn entries_missing_from_excludes_known_hashes() {
        let mut store = EntryStore::new();
        store.insert(b"a".to_vec());
        store.insert(b"b".to_vec());
        let known = vec![leaf_hash(b"a")];
        let missing = store.entries_missing_from(&known, 100);
        assert_eq!(missing, vec![b"b".to_vec()]);
    }

    #[test]
    fn store_key_wire_round_trip() {
        for key in StoreKey::ALL {
            assert_eq!(StoreKey::from_wire_name(key.wire_name()), Some(key));
        }
    }
}
