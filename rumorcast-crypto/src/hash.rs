//! SHA-256 hashing.

use sha2::{Digest, Sha256 as Sha256Hasher};
use std::fmt;

/// A 32-byte SHA-256 digest.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Sha256(pub [u8; 32]);

/// The SHA-256 of the literal bytes `b"empty"`, used as the Merkle root of an
/// empty store (4.I).
pub const EMPTY_SHA256: Sha256 = Sha256([
    0x2e, 0x1c, 0xfa, 0x82, 0xb0, 0x35, 0xc2, 0x6c, 0xbb, 0xbd, 0xae, 0x63, 0x2c, 0xea, 0x07, 0x05,
    0x14, 0xeb, 0x8b, 0x77, 0x3f, 0x61, 0x6a, 0xae, 0xaf, 0x66, 0x8e, 0x2f, 0x0b, 0xe8, 0xf1, 0x0d,
]);

/// Calculate the SHA-256 hash of `bytes`.
pub fn calculate_sha256(bytes: &[u8]) -> Sha256 {
    let mut hasher = Sha256Hasher::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    Sha256(hash)
}

impl Sha256 {
    /// Lowercase hex representation, as used on the wire for sync roots
    /// (`/sync/1.0` `roots: map{storeKey -> hexHash}`).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse a lowercase hex representation back into a digest. Errors if
    /// `s` isn't valid hex or doesn't decode to exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Sha256(out))
    }
}

impl fmt::Debug for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", self.to_hex())
    }
}

impl fmt::Display for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
