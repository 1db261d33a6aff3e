//! Merkle tree used by the Anti-Entropy Sync (4.I).
//!
//! Leaf hash is `SHA-256` of the canonical serialization of a store entry;
//! internal hash is `SHA-256(left || right)`; a node with no sibling at a
//! given layer is promoted unpaired to the next layer instead of being
//! hashed with itself.

use crate::hash::{calculate_sha256, Sha256, EMPTY_SHA256};

/// Hash a leaf's canonical bytes.
pub fn leaf_hash(canonical_bytes: &[u8]) -> Sha256 {
    calculate_sha256(canonical_bytes)
}

/// `sha256(a || b)`.
pub fn sha256_concat(a: Sha256, b: Sha256) -> Sha256 {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&a.0);
    buf.extend_from_slice(&b.0);
    calculate_sha256(&buf)
}

/// Compute the Merkle root of an ordered sequence of leaf hashes.
///
/// An empty input yields [`EMPTY_SHA256`] (§4.I: "Empty store -> hash of
/// literal 'empty'"). Order matters: the root is only equal for two stores
/// with identical *ordered* sequences of entries (P8).
pub fn merkle_root(leaves: &[Sha256]) -> Sha256 {
    if leaves.is_empty() {
        return EMPTY_SHA256;
    }

    let mut layer = leaves.to_vec();
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => sha256_concat(*left, *right),
                [only] => *only,
                _ => unreachable!("chunks(2) never yields more than 2 elements"),
            })
            .collect();
    }

    layer[0]
}
