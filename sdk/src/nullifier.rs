//! Claim nullifiers
//!
//! `nullifier = SHA256("SIP-NULLIFIER-v1" || transfer_id || stealth_secret)`.
//! Only the holder of the stealth key can compute it, and the same key and
//! transfer always give the same value, so a repeated claim collides with
//! the ledger's nullifier record.

use crate::curve::{sha256, SecretScalar};

const NULLIFIER_DOMAIN: &[u8] = b"SIP-NULLIFIER-v1";

pub fn derive_nullifier(transfer_id: &[u8; 32], stealth_secret: &SecretScalar) -> [u8; 32] {
    sha256(&[NULLIFIER_DOMAIN, transfer_id, stealth_secret.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;

    #[test]
    fn test_nullifier_deterministic_per_transfer() {
        let secret = SecretScalar::random(Curve::Ed25519);
        let a = derive_nullifier(&[1u8; 32], &secret);
        assert_eq!(a, derive_nullifier(&[1u8; 32], &secret));
        assert_ne!(a, derive_nullifier(&[2u8; 32], &secret));
        assert_ne!(a, derive_nullifier(&[1u8; 32], &SecretScalar::random(Curve::Ed25519)));
    }
}
