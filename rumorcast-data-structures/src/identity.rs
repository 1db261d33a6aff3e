//! Identity & transport collaborator traits (§1, §6).
//!
//! Membership proofs and DKIM verification are external collaborators
//! specified only at their interface; this core never implements a ZK
//! circuit or an email signature check.
use thiserror::Error;

/// Hex-encoded Merkle root of a membership group.
pub type MerkleRootHex = String;

/// Opaque zero-knowledge membership proof, passed through unverified by the
/// core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZkProof {
    /// Nullifier asserted by the proof.
    pub nullifier: String,
    /// Claimed Merkle root of the membership set the proof was generated
    /// against.
    pub merkle_root: String,
    /// Opaque proof bytes.
    pub proof_bytes: Vec<u8>,
}

/// Output of a successful membership check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedMembership {
    /// The nullifier admitted by the proof.
    pub nullifier: String,
}

/// Output of a successful DKIM check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedDkim {
    /// The signing domain extracted from the DKIM signature.
    pub domain: String,
}

/// Failure from either collaborator trait.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The proof did not verify against any known root.
    #[error("membership proof rejected")]
    InvalidMembershipProof,
    /// The DKIM signature did not verify, or no `d=` domain was present.
    #[error("dkim verification failed")]
    InvalidDkimSignature,
}

/// Verifies zero-knowledge membership proofs against a set of known
/// membership-tree roots.
pub trait MembershipVerifier {
    /// Verify `proof` against `known_roots`, returning the admitted
    /// nullifier on success.
    fn verify_membership_proof(
        &self,
        proof: &ZkProof,
        known_roots: &[MerkleRootHex],
    ) -> Result<VerifiedMembership, IdentityError>;
}

/// Verifies DKIM-signed email proof-of-membership (e.g. a `.edu` mailing
/// list confirmation).
pub trait DkimVerifier {
    /// Verify a raw signed email, returning the domain it was signed for on
    /// success.
    fn verify_dkim(&self, eml_bytes: &[u8]) -> Result<VerifiedDkim, IdentityError>;
}

/// A [`MembershipVerifier`] that accepts every proof, for tests and
/// demonstrations where a concrete ZK backend is not wired up.
#[derive(Debug, Default)]
pub struct NullMembershipVerifier;

impl MembershipVerifier for NullMembershipVerifier {
    fn verify_membership_proof(
        &self,
        proof: &ZkProof,
        _known_roots: &[MerkleRootHex],
    ) -> Result<VerifiedMembership, IdentityError> {
        Ok(VerifiedMembership {
            nullifier: proof.nullifier.clone(),
        })
    }
}

/// A [`DkimVerifier`] that always succeeds with a fixed domain, for tests
/// and demonstrations.
#[derive(Debug)]
pub struct NullDkimVerifier {
    /// Domain returned for every call.
    pub domain: String,
}

impl DkimVerifier for NullDkimVerifier {
    fn verify_dkim(&self, _eml_bytes: &[u8]) -> Result<VerifiedDkim, IdentityError> {
        Ok(VerifiedDkim {
            domain: self.domain.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_membership_verifier_always_succeeds() {
        let verifier = NullMembershipVerifier;
        let proof = ZkProof {
            nullifier: "n1".into(),
            merkle_root: "r1".into(),
            proof_bytes: vec![],
        };
        let result = verifier.verify_membership_proof(&proof, &[]).unwrap();
        assert_eq!(result.nullifier, "n1");
    }

    #[test]
    fn null_dkim_verifier_returns_fixed_domain() {
        let verifier = NullDkimVerifier {
            domain: "university.edu".into(),
        };
        let result = verifier.verify_dkim(b"raw eml").unwrap();
        assert_eq!(result.domain, "university.edu");
    }
}
