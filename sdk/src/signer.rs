//! Stealth transaction signer
//!
//! Wallet keys are ordinary [`solana_sdk::signature::Keypair`]s. A stealth
//! address is controlled by a raw scalar (`a = spend_secret + h`), which a
//! seed-based keypair would hash to something else, so [`StealthSigner`]
//! signs with the scalar directly and plugs into the same [`Signer`] trait.

use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{ExpandedSecretKey, PublicKey as DalekPublicKey, Signature as DalekSignature};
use sha2::{Digest, Sha512};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Signature, Signer, SignerError},
};
use zeroize::Zeroize;

use crate::curve::{Curve, PublicKey, SecretScalar};
use crate::error::{Error, Result};

/// Domain separator for nonce derivation in signing
const NONCE_DOMAIN: &[u8] = b"SIP-STEALTH-NONCE-v1";

/// Signs for a stealth address using the scalar from `derive_private_key`
///
/// The expanded secret key is `[scalar (32) | nonce_prefix (32)]` where the
/// nonce prefix is `SHA512(domain || scalar)[..32]`, so signatures are
/// deterministic per message.
pub struct StealthSigner {
    pubkey: Pubkey,
    expanded: ExpandedSecretKey,
    dalek_pubkey: DalekPublicKey,
}

impl StealthSigner {
    pub fn from_secret(secret: &SecretScalar) -> Result<Self> {
        if secret.curve() != Curve::Ed25519 {
            return Err(Error::CurveMismatch {
                expected: Curve::Ed25519,
                actual: secret.curve(),
            });
        }
        let public_bytes = match secret.public_key()? {
            PublicKey::Ed25519(bytes) => bytes,
            PublicKey::Secp256k1(_) => {
                return Err(Error::Signing("unexpected secp256k1 public key".into()))
            }
        };

        let mut scalar_bytes = Scalar::from_bytes_mod_order(*secret.as_bytes()).to_bytes();

        let mut nonce_hasher = Sha512::new();
        nonce_hasher.update(NONCE_DOMAIN);
        nonce_hasher.update(scalar_bytes);
        let nonce_hash = nonce_hasher.finalize();

        let mut expanded_bytes = [0u8; 64];
        expanded_bytes[..32].copy_from_slice(&scalar_bytes);
        expanded_bytes[32..].copy_from_slice(&nonce_hash[..32]);

        let expanded = ExpandedSecretKey::from_bytes(&expanded_bytes)
            .map_err(|e| Error::Signing(format!("invalid scalar: {}", e)));
        let dalek_pubkey = DalekPublicKey::from_bytes(&public_bytes)
            .map_err(|e| Error::Signing(format!("invalid pubkey: {}", e)));

        scalar_bytes.zeroize();
        expanded_bytes.zeroize();

        Ok(Self {
            pubkey: Pubkey::new_from_array(public_bytes),
            expanded: expanded?,
            dalek_pubkey: dalek_pubkey?,
        })
    }
}

impl Signer for StealthSigner {
    fn try_pubkey(&self) -> std::result::Result<Pubkey, SignerError> {
        Ok(self.pubkey)
    }

    fn try_sign_message(&self, message: &[u8]) -> std::result::Result<Signature, SignerError> {
        let sig: DalekSignature = self.expanded.sign(message, &self.dalek_pubkey);
        Ok(Signature::from(sig.to_bytes()))
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

impl PartialEq for StealthSigner {
    fn eq(&self, other: &Self) -> bool {
        self.pubkey == other.pubkey
    }
}

impl std::fmt::Debug for StealthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthSigner")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}
