//! Stealth addresses
//!
//! Dual-key scheme over either supported curve:
//!
//! ```text
//! recipient:  P = p·G (spending), Q = q·G (viewing)
//! sender:     R = r·G, S = r·Q, h = SHA256(S), view_tag = h[0], A = P + h·G
//! recipient:  S' = q·R, h' = SHA256(S'), check view tag, then A == P + h'·G
//! spend key:  a = p + h (mod n)
//! ```
//!
//! Security features:
//! - Secret keys are owned by [`StealthKeys`] and zeroized on drop
//! - Address comparison during scanning is constant-time
//! - BIP-39 mnemonic support for key recovery

use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};
use solana_sdk::pubkey::Pubkey;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::curve::{shared_secret_hash, sha256, tweak_public_key, Curve, PublicKey, SecretScalar};
use crate::error::{Error, Result};
use crate::signer::StealthSigner;

/// Meta-address scheme prefix
pub const META_ADDRESS_PREFIX: &str = "sip";

const MNEMONIC_SPENDING_DOMAIN: &[u8] = b"sip/spending";
const MNEMONIC_VIEWING_DOMAIN: &[u8] = b"sip/viewing";

// ============================================================================
// Meta-address
// ============================================================================

/// A recipient's reusable public identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StealthMetaAddress {
    pub chain: String,
    pub spending_public_key: PublicKey,
    pub viewing_public_key: PublicKey,
    /// Local annotation; not part of the encoded form
    pub label: Option<String>,
}

impl StealthMetaAddress {
    pub fn new(chain: &str, spending_public_key: PublicKey, viewing_public_key: PublicKey) -> Result<Self> {
        let curve = Curve::for_chain(chain)?;
        for key in [&spending_public_key, &viewing_public_key] {
            if key.curve() != curve {
                return Err(Error::CurveMismatch {
                    expected: curve,
                    actual: key.curve(),
                });
            }
        }
        Ok(Self {
            chain: chain.to_ascii_lowercase(),
            spending_public_key,
            viewing_public_key,
            label: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn curve(&self) -> Curve {
        self.spending_public_key.curve()
    }

    /// `sip:<chain>:<0xspending>:<0xviewing>`
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            META_ADDRESS_PREFIX,
            self.chain,
            self.spending_public_key.to_hex(),
            self.viewing_public_key.to_hex()
        )
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let parts: Vec<&str> = encoded.split(':').collect();
        let [prefix, chain, spending, viewing] = parts.as_slice() else {
            return Err(Error::InvalidMetaAddress(format!(
                "expected 4 ':'-separated parts, got {}",
                parts.len()
            )));
        };
        if *prefix != META_ADDRESS_PREFIX {
            return Err(Error::InvalidMetaAddress(format!("unknown prefix '{}'", prefix)));
        }
        let curve = Curve::for_chain(chain)?;
        Self::new(
            chain,
            PublicKey::from_hex(curve, spending)?,
            PublicKey::from_hex(curve, viewing)?,
        )
    }
}

impl fmt::Display for StealthMetaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StealthMetaAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

// ============================================================================
// One-time addresses
// ============================================================================

/// A one-time address derived for a single payment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StealthAddress {
    pub address: PublicKey,
    pub ephemeral_public_key: PublicKey,
    pub view_tag: u8,
}

impl StealthAddress {
    /// Ledger address for an ed25519 stealth key
    pub fn to_pubkey(&self) -> Option<Pubkey> {
        match self.address {
            PublicKey::Ed25519(bytes) => Some(Pubkey::new_from_array(bytes)),
            PublicKey::Secp256k1(_) => None,
        }
    }

    /// EVM account for a secp256k1 stealth key
    pub fn to_eth_address(&self) -> Result<String> {
        public_key_to_eth_address(&self.address)
    }
}

/// EIP-55 checksummed EVM address of a secp256k1 key
///
/// `keccak256(uncompressed_point[1..])[12..]`, hex-encoded with each
/// letter upper-cased when the matching nibble of the address hash is 8 or
/// more.
pub fn public_key_to_eth_address(public_key: &PublicKey) -> Result<String> {
    let PublicKey::Secp256k1(compressed) = public_key else {
        return Err(Error::CurveMismatch {
            expected: Curve::Secp256k1,
            actual: public_key.curve(),
        });
    };
    let point = k256::PublicKey::from_sec1_bytes(compressed)
        .map_err(|_| Error::MalformedKey("not a point on secp256k1".into()))?;
    let uncompressed = point.to_encoded_point(false);

    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    let address_hex = hex::encode(&hash[12..]);
    let checksum = Keccak256::digest(address_hex.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in address_hex.chars().enumerate() {
        let nibble = (checksum[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Sender-side result of deriving a stealth address
pub struct StealthDerivation {
    pub stealth_address: StealthAddress,
    /// Ephemeral secret `r`; reusable to seal the payment's metadata
    pub ephemeral_secret: SecretScalar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Mine,
    NotMine,
}

impl ScanOutcome {
    pub fn is_mine(&self) -> bool {
        matches!(self, ScanOutcome::Mine)
    }
}

// ============================================================================
// Stealth Keys
// ============================================================================

/// A recipient's complete key set
///
/// Clone is NOT derived: the spending and viewing secrets have exactly one
/// owner.
pub struct StealthKeys {
    spending_secret: SecretScalar,
    viewing_secret: SecretScalar,
    meta_address: StealthMetaAddress,
}

impl StealthKeys {
    /// Generate new random keys for `chain`
    pub fn generate(chain: &str) -> Result<Self> {
        let curve = Curve::for_chain(chain)?;
        Self::from_scalars(
            chain,
            SecretScalar::random(curve),
            SecretScalar::random(curve),
        )
    }

    /// Rebuild keys from exported secrets
    pub fn from_secrets(chain: &str, spending_secret: &[u8; 32], viewing_secret: &[u8; 32]) -> Result<Self> {
        let curve = Curve::for_chain(chain)?;
        Self::from_scalars(
            chain,
            SecretScalar::from_bytes(curve, spending_secret)?,
            SecretScalar::from_bytes(curve, viewing_secret)?,
        )
    }

    /// Derive keys from a BIP-39 mnemonic phrase
    ///
    /// - spending = H("sip/spending" || seed) mod n
    /// - viewing = H("sip/viewing" || seed) mod n
    pub fn from_mnemonic(chain: &str, phrase: &str, passphrase: &str) -> Result<Self> {
        use bip39::Mnemonic;

        let curve = Curve::for_chain(chain)?;
        let mnemonic: Mnemonic = phrase
            .parse()
            .map_err(|e: bip39::Error| Error::InvalidMnemonic(e.to_string()))?;
        let mut seed = mnemonic.to_seed(passphrase);

        let mut spending_hash = sha256(&[MNEMONIC_SPENDING_DOMAIN, &seed]);
        let mut viewing_hash = sha256(&[MNEMONIC_VIEWING_DOMAIN, &seed]);
        seed.zeroize();

        let spending = SecretScalar::from_hash(curve, &spending_hash);
        let viewing = SecretScalar::from_hash(curve, &viewing_hash);
        spending_hash.zeroize();
        viewing_hash.zeroize();

        Self::from_scalars(chain, spending?, viewing?)
    }

    /// Generate a fresh 24-word mnemonic and the keys it derives
    pub fn generate_with_mnemonic(chain: &str) -> Result<(Self, String)> {
        use bip39::Mnemonic;

        let mut entropy = crate::curve::random_bytes32();
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()));
        entropy.zeroize();

        let phrase = mnemonic?.to_string();
        let keys = Self::from_mnemonic(chain, &phrase, "")?;
        Ok((keys, phrase))
    }

    fn from_scalars(chain: &str, spending_secret: SecretScalar, viewing_secret: SecretScalar) -> Result<Self> {
        let meta_address = StealthMetaAddress::new(
            chain,
            spending_secret.public_key()?,
            viewing_secret.public_key()?,
        )?;
        Ok(Self {
            spending_secret,
            viewing_secret,
            meta_address,
        })
    }

    pub fn meta_address(&self) -> &StealthMetaAddress {
        &self.meta_address
    }

    pub fn spending_secret(&self) -> &SecretScalar {
        &self.spending_secret
    }

    pub fn viewing_secret(&self) -> &SecretScalar {
        &self.viewing_secret
    }

    /// Export secrets as bytes (for encrypted storage)
    ///
    /// WARNING: Handle these bytes with extreme care!
    pub fn export_secrets(&self) -> ([u8; 32], [u8; 32]) {
        (*self.spending_secret.as_bytes(), *self.viewing_secret.as_bytes())
    }

    /// Scan a candidate with this key set
    pub fn scan(&self, candidate: &StealthAddress) -> ScanOutcome {
        scan(
            candidate,
            &self.meta_address.spending_public_key,
            &self.viewing_secret,
        )
    }

    /// Spending key for a candidate already confirmed as [`ScanOutcome::Mine`]
    pub fn derive_private_key(&self, candidate: &StealthAddress) -> Result<SecretScalar> {
        derive_private_key(candidate, &self.spending_secret, &self.viewing_secret)
    }

    /// Signer for an ed25519 stealth address owned by these keys
    pub fn signer_for(&self, candidate: &StealthAddress) -> Result<StealthSigner> {
        StealthSigner::from_secret(&self.derive_private_key(candidate)?)
    }
}

impl fmt::Debug for StealthKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StealthKeys")
            .field("meta_address", &self.meta_address.encode())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Protocol operations
// ============================================================================

/// Sample spending and viewing keys for `chain`
pub fn generate_meta_address(chain: &str) -> Result<(StealthMetaAddress, SecretScalar, SecretScalar)> {
    let keys = StealthKeys::generate(chain)?;
    let StealthKeys {
        spending_secret,
        viewing_secret,
        meta_address,
    } = keys;
    Ok((meta_address, spending_secret, viewing_secret))
}

/// Sender side: derive a fresh one-time address for `meta`
pub fn derive_stealth_address(meta: &StealthMetaAddress) -> Result<StealthDerivation> {
    derive_stealth_address_with(meta, SecretScalar::random(meta.curve()))
}

/// Deterministic variant taking the ephemeral secret `r`
pub fn derive_stealth_address_with(
    meta: &StealthMetaAddress,
    ephemeral_secret: SecretScalar,
) -> Result<StealthDerivation> {
    if ephemeral_secret.curve() != meta.curve() {
        return Err(Error::CurveMismatch {
            expected: meta.curve(),
            actual: ephemeral_secret.curve(),
        });
    }
    let ephemeral_public_key = ephemeral_secret.public_key()?;
    let mut h = shared_secret_hash(&ephemeral_secret, &meta.viewing_public_key)?;
    let address = tweak_public_key(&meta.spending_public_key, &h);
    let view_tag = h[0];
    h.zeroize();

    Ok(StealthDerivation {
        stealth_address: StealthAddress {
            address: address?,
            ephemeral_public_key,
            view_tag,
        },
        ephemeral_secret,
    })
}

/// Recipient side: is `candidate` addressed to `(P, q)`?
///
/// The view tag rejects 255/256 of foreign payments with one ECDH and no
/// point addition. Any curve mismatch or arithmetic failure is `NotMine`.
pub fn scan(
    candidate: &StealthAddress,
    spending_public_key: &PublicKey,
    viewing_secret: &SecretScalar,
) -> ScanOutcome {
    let curve = viewing_secret.curve();
    if candidate.address.curve() != curve
        || candidate.ephemeral_public_key.curve() != curve
        || spending_public_key.curve() != curve
    {
        return ScanOutcome::NotMine;
    }

    let Ok(mut h) = shared_secret_hash(viewing_secret, &candidate.ephemeral_public_key) else {
        return ScanOutcome::NotMine;
    };
    if h[0] != candidate.view_tag {
        h.zeroize();
        return ScanOutcome::NotMine;
    }

    let expected = tweak_public_key(spending_public_key, &h);
    h.zeroize();
    match expected {
        Ok(expected) if bool::from(expected.as_bytes().ct_eq(candidate.address.as_bytes())) => {
            ScanOutcome::Mine
        }
        _ => ScanOutcome::NotMine,
    }
}

/// `a = p + h (mod n)`
///
/// Callers must gate on [`scan`]: for a foreign address this returns a key
/// that controls nothing.
pub fn derive_private_key(
    candidate: &StealthAddress,
    spending_secret: &SecretScalar,
    viewing_secret: &SecretScalar,
) -> Result<SecretScalar> {
    if spending_secret.curve() != viewing_secret.curve() {
        return Err(Error::CurveMismatch {
            expected: viewing_secret.curve(),
            actual: spending_secret.curve(),
        });
    }
    let mut h = shared_secret_hash(viewing_secret, &candidate.ephemeral_public_key)?;
    let key = spending_secret.add_tweak(&h);
    h.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stealth_roundtrip_all_curves() {
        for chain in ["ethereum", "solana"] {
            let keys = StealthKeys::generate(chain).unwrap();
            let derivation = derive_stealth_address(keys.meta_address()).unwrap();
            let candidate = derivation.stealth_address;

            assert_eq!(keys.scan(&candidate), ScanOutcome::Mine);

            let private = keys.derive_private_key(&candidate).unwrap();
            assert_eq!(private.public_key().unwrap(), candidate.address);
        }
    }

    #[test]
    fn test_foreign_keys_do_not_match() {
        let alice = StealthKeys::generate("solana").unwrap();
        let bob = StealthKeys::generate("solana").unwrap();
        let candidate = derive_stealth_address(alice.meta_address())
            .unwrap()
            .stealth_address;
        assert_eq!(bob.scan(&candidate), ScanOutcome::NotMine);
    }

    #[test]
    fn test_wrong_view_tag_short_circuits() {
        let keys = StealthKeys::generate("ethereum").unwrap();
        let mut candidate = derive_stealth_address(keys.meta_address())
            .unwrap()
            .stealth_address;
        candidate.view_tag = candidate.view_tag.wrapping_add(1);
        assert_eq!(keys.scan(&candidate), ScanOutcome::NotMine);
    }

    #[test]
    fn test_matching_tag_wrong_address_rejected() {
        let keys = StealthKeys::generate("ethereum").unwrap();
        let a = derive_stealth_address(keys.meta_address()).unwrap().stealth_address;
        let b = derive_stealth_address(keys.meta_address()).unwrap().stealth_address;
        let forged = StealthAddress {
            address: b.address,
            ephemeral_public_key: a.ephemeral_public_key,
            view_tag: a.view_tag,
        };
        assert_eq!(keys.scan(&forged), ScanOutcome::NotMine);
    }

    #[test]
    fn test_view_only_scanning() {
        let keys = StealthKeys::generate("near").unwrap();
        let candidate = derive_stealth_address(keys.meta_address())
            .unwrap()
            .stealth_address;
        let outcome = scan(
            &candidate,
            &keys.meta_address().spending_public_key,
            keys.viewing_secret(),
        );
        assert!(outcome.is_mine());
    }

    #[test]
    fn test_deterministic_derivation() {
        let keys = StealthKeys::generate("solana").unwrap();
        let r = SecretScalar::from_bytes(Curve::Ed25519, &[5u8; 32]).unwrap();
        let a = derive_stealth_address_with(keys.meta_address(), r.duplicate()).unwrap();
        let b = derive_stealth_address_with(keys.meta_address(), r).unwrap();
        assert_eq!(a.stealth_address, b.stealth_address);
    }

    #[test]
    fn test_meta_address_encoding_roundtrip() {
        for chain in ["ethereum", "solana"] {
            let keys = StealthKeys::generate(chain).unwrap();
            let encoded = keys.meta_address().encode();
            assert!(encoded.starts_with(&format!("sip:{}:0x", chain)));
            let decoded: StealthMetaAddress = encoded.parse().unwrap();
            assert_eq!(&decoded, keys.meta_address());
        }
    }

    #[test]
    fn test_meta_address_decode_errors() {
        assert!(matches!(
            StealthMetaAddress::decode("sip:ethereum:0x02"),
            Err(Error::InvalidMetaAddress(_))
        ));
        assert!(matches!(
            StealthMetaAddress::decode("eth:ethereum:0x02:0x03"),
            Err(Error::InvalidMetaAddress(_))
        ));
        assert!(matches!(
            StealthMetaAddress::decode("sip:dogecoin:0x02:0x03"),
            Err(Error::UnsupportedChain(_))
        ));
        let keys = StealthKeys::generate("ethereum").unwrap();
        let bad = format!(
            "sip:ethereum:0x04{}:{}",
            "11".repeat(32),
            keys.meta_address().viewing_public_key.to_hex()
        );
        assert!(matches!(
            StealthMetaAddress::decode(&bad),
            Err(Error::MalformedKey(_))
        ));
    }

    #[test]
    fn test_curve_mismatch_in_meta_address() {
        let secp = SecretScalar::random(Curve::Secp256k1).public_key().unwrap();
        let ed = SecretScalar::random(Curve::Ed25519).public_key().unwrap();
        assert!(matches!(
            StealthMetaAddress::new("solana", secp, ed),
            Err(Error::CurveMismatch { .. })
        ));
    }

    #[test]
    fn test_unsupported_chain_rejected() {
        assert!(matches!(
            generate_meta_address("cardano"),
            Err(Error::UnsupportedChain(_))
        ));
    }

    #[test]
    fn test_mnemonic_recovery() {
        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let a = StealthKeys::from_mnemonic("solana", mnemonic, "").unwrap();
        let b = StealthKeys::from_mnemonic("solana", mnemonic, "").unwrap();
        assert_eq!(a.meta_address(), b.meta_address());

        let c = StealthKeys::from_mnemonic("solana", mnemonic, "password").unwrap();
        assert_ne!(a.meta_address(), c.meta_address());

        assert!(matches!(
            StealthKeys::from_mnemonic("solana", "not a mnemonic", ""),
            Err(Error::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_stealth_signer_controls_address() {
        let keys = StealthKeys::generate("solana").unwrap();
        let candidate = derive_stealth_address(keys.meta_address())
            .unwrap()
            .stealth_address;
        let signer = keys.signer_for(&candidate).unwrap();
        assert_eq!(Some(solana_sdk::signature::Signer::pubkey(&signer)), candidate.to_pubkey());
    }

    #[test]
    fn test_eth_address_known_vector() {
        // Secret key 1 is the generator point
        let mut one = [0u8; 32];
        one[31] = 1;
        let public = SecretScalar::from_bytes(Curve::Secp256k1, &one)
            .unwrap()
            .public_key()
            .unwrap();
        assert_eq!(
            public_key_to_eth_address(&public).unwrap(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_eth_address_for_stealth_payment() {
        let keys = StealthKeys::generate("ethereum").unwrap();
        let candidate = derive_stealth_address(keys.meta_address())
            .unwrap()
            .stealth_address;
        let address = candidate.to_eth_address().unwrap();
        assert_eq!(address.len(), 42);
        assert!(address.starts_with("0x"));

        // The claimant's derived key maps to the same account
        let private = keys.derive_private_key(&candidate).unwrap();
        assert_eq!(
            public_key_to_eth_address(&private.public_key().unwrap()).unwrap(),
            address
        );

        let ed = SecretScalar::random(Curve::Ed25519).public_key().unwrap();
        assert!(matches!(
            public_key_to_eth_address(&ed),
            Err(Error::CurveMismatch { .. })
        ));
    }
}
