//! Commitment hashing for the preorder/register handshake

use crate::types::{CommitmentHash, DomainName};
use sha2::{Digest, Sha256};

/// `SHA-256(name ‖ salt)`.
///
/// Callers publish this in `preorder`; `register` recomputes it from the
/// revealed name and salt.
pub fn compute_commitment(name: &DomainName, salt: &[u8]) -> CommitmentHash {
    let mut h = Sha256::new();
    h.update(name.as_str().as_bytes());
    h.update(salt);
    CommitmentHash(h.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_is_deterministic() {
        let name = DomainName::new("alice");
        assert_eq!(
            compute_commitment(&name, b"salt"),
            compute_commitment(&name, b"salt")
        );
    }

    #[test]
    fn salt_changes_commitment() {
        let name = DomainName::new("alice");
        assert_ne!(
            compute_commitment(&name, b"salt-1"),
            compute_commitment(&name, b"salt-2")
        );
    }

    #[test]
    fn matches_plain_sha256_of_concatenation() {
        let expected: [u8; 32] = Sha256::digest(b"alicepepper").into();
        assert_eq!(
            compute_commitment(&DomainName::new("alice"), b"pepper").0,
            expected
        );
    }
}
