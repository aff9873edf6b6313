//! Curve arithmetic shared by stealth addresses, viewing keys and commitments
//!
//! Two curve families are supported:
//! - secp256k1 for EVM-style chains (33-byte SEC1 compressed points)
//! - ed25519 for Solana/NEAR-style chains (32-byte compressed Edwards Y)
//!
//! Public keys are validated when parsed, so every [`PublicKey`] in memory
//! is an on-curve, non-identity point. Secret scalars are zeroized on drop.

use std::fmt;

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar as EdScalar,
};
use k256::{
    elliptic_curve::{group::Group, ops::Reduce, sec1::ToEncodedPoint},
    FieldBytes, NonZeroScalar, ProjectivePoint, Scalar as SecpScalar, U256,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::encoding::{from_hex_prefixed, to_hex_prefixed};
use crate::error::{Error, Result};

/// Size of a compressed secp256k1 point
pub const SECP256K1_POINT_SIZE: usize = 33;

/// Size of a compressed ed25519 point
pub const ED25519_POINT_SIZE: usize = 32;

/// Tag byte marking a 32-byte ed25519 key inside a 33-byte wire slot
pub const ED25519_WIRE_TAG: u8 = 0x00;

// ============================================================================
// Curve selection
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Secp256k1,
    Ed25519,
}

/// Chain families grouped by their native key scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    Evm,
    Bitcoin,
    Zcash,
    Solana,
    Near,
}

impl ChainFamily {
    pub fn for_chain(chain: &str) -> Result<Self> {
        match chain.to_ascii_lowercase().as_str() {
            "ethereum" | "polygon" | "arbitrum" | "optimism" | "base" | "bsc" => Ok(ChainFamily::Evm),
            "bitcoin" => Ok(ChainFamily::Bitcoin),
            "zcash" => Ok(ChainFamily::Zcash),
            "solana" => Ok(ChainFamily::Solana),
            "near" => Ok(ChainFamily::Near),
            _ => Err(Error::UnsupportedChain(chain.to_string())),
        }
    }

    pub fn curve(&self) -> Curve {
        match self {
            ChainFamily::Evm | ChainFamily::Bitcoin | ChainFamily::Zcash => Curve::Secp256k1,
            ChainFamily::Solana | ChainFamily::Near => Curve::Ed25519,
        }
    }
}

/// Resolve the curve a chain uses for stealth keys
pub fn curve_for_chain(chain: &str) -> Result<Curve> {
    ChainFamily::for_chain(chain).map(|family| family.curve())
}

impl Curve {
    pub fn for_chain(chain: &str) -> Result<Self> {
        curve_for_chain(chain)
    }

    /// Length of a compressed public key on this curve
    pub fn point_size(&self) -> usize {
        match self {
            Curve::Secp256k1 => SECP256K1_POINT_SIZE,
            Curve::Ed25519 => ED25519_POINT_SIZE,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Secp256k1 => write!(f, "secp256k1"),
            Curve::Ed25519 => write!(f, "ed25519"),
        }
    }
}

// ============================================================================
// Public keys
// ============================================================================

/// A validated compressed public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicKey {
    Secp256k1([u8; SECP256K1_POINT_SIZE]),
    Ed25519([u8; ED25519_POINT_SIZE]),
}

impl PublicKey {
    /// Parse and validate a compressed point for the given curve
    pub fn parse(curve: Curve, bytes: &[u8]) -> Result<Self> {
        match curve {
            Curve::Secp256k1 => {
                let arr: [u8; SECP256K1_POINT_SIZE] = bytes.try_into().map_err(|_| {
                    Error::MalformedKey(format!("expected 33 bytes, got {}", bytes.len()))
                })?;
                if arr[0] != 0x02 && arr[0] != 0x03 {
                    return Err(Error::MalformedKey("not a compressed SEC1 point".into()));
                }
                decode_secp_point(&arr)?;
                Ok(PublicKey::Secp256k1(arr))
            }
            Curve::Ed25519 => {
                let arr: [u8; ED25519_POINT_SIZE] = bytes.try_into().map_err(|_| {
                    Error::MalformedKey(format!("expected 32 bytes, got {}", bytes.len()))
                })?;
                decode_edwards_point(&arr)?;
                Ok(PublicKey::Ed25519(arr))
            }
        }
    }

    /// Parse a `0x`-prefixed hex key
    pub fn from_hex(curve: Curve, s: &str) -> Result<Self> {
        let bytes = from_hex_prefixed(s)?;
        Self::parse(curve, &bytes)
    }

    pub fn to_hex(&self) -> String {
        to_hex_prefixed(self.as_bytes())
    }

    pub fn curve(&self) -> Curve {
        match self {
            PublicKey::Secp256k1(_) => Curve::Secp256k1,
            PublicKey::Ed25519(_) => Curve::Ed25519,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Secp256k1(b) => b,
            PublicKey::Ed25519(b) => b,
        }
    }

    /// Fixed 33-byte ledger encoding
    ///
    /// secp256k1 keys are stored as-is; ed25519 keys are prefixed with
    /// [`ED25519_WIRE_TAG`], which can never start a SEC1 point.
    pub fn to_wire_bytes(&self) -> [u8; 33] {
        match self {
            PublicKey::Secp256k1(b) => *b,
            PublicKey::Ed25519(b) => {
                let mut out = [0u8; 33];
                out[0] = ED25519_WIRE_TAG;
                out[1..].copy_from_slice(b);
                out
            }
        }
    }

    pub fn from_wire_bytes(bytes: &[u8; 33]) -> Result<Self> {
        if bytes[0] == ED25519_WIRE_TAG {
            Self::parse(Curve::Ed25519, &bytes[1..])
        } else {
            Self::parse(Curve::Secp256k1, bytes)
        }
    }

    pub(crate) fn secp_point(&self) -> Result<ProjectivePoint> {
        match self {
            PublicKey::Secp256k1(b) => decode_secp_point(b),
            PublicKey::Ed25519(_) => Err(Error::CurveMismatch {
                expected: Curve::Secp256k1,
                actual: Curve::Ed25519,
            }),
        }
    }

    pub(crate) fn edwards_point(&self) -> Result<EdwardsPoint> {
        match self {
            PublicKey::Ed25519(b) => decode_edwards_point(b),
            PublicKey::Secp256k1(_) => Err(Error::CurveMismatch {
                expected: Curve::Ed25519,
                actual: Curve::Secp256k1,
            }),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}:{})", self.curve(), self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ============================================================================
// Zeroizing Scalar Wrapper
// ============================================================================

/// A secret scalar tagged with its curve, zeroized on drop
///
/// The bytes are always the canonical little-endian (ed25519) or
/// big-endian (secp256k1) encoding of a non-zero scalar. Not `Clone`:
/// a second copy only comes from [`SecretScalar::duplicate`].
pub struct SecretScalar {
    curve: Curve,
    bytes: [u8; 32],
}

impl SecretScalar {
    /// Sample a fresh non-zero scalar from OS entropy
    pub fn random(curve: Curve) -> Self {
        match curve {
            Curve::Secp256k1 => Self::from_secp(random_secp_scalar().as_ref()),
            Curve::Ed25519 => Self::from_ed(&random_ed_scalar()),
        }
    }

    /// Load a scalar from raw bytes
    ///
    /// secp256k1 scalars must be canonical; ed25519 bytes are reduced mod l.
    /// Zero is rejected on both curves.
    pub fn from_bytes(curve: Curve, bytes: &[u8; 32]) -> Result<Self> {
        match curve {
            Curve::Secp256k1 => {
                let scalar = Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(
                    FieldBytes::from(*bytes),
                ))
                .ok_or_else(|| Error::MalformedKey("invalid secp256k1 scalar".into()))?;
                Ok(Self::from_secp(scalar.as_ref()))
            }
            Curve::Ed25519 => {
                let scalar = EdScalar::from_bytes_mod_order(*bytes);
                if scalar == EdScalar::zero() {
                    return Err(Error::MalformedKey("zero ed25519 scalar".into()));
                }
                Ok(Self::from_ed(&scalar))
            }
        }
    }

    /// Reduce a 32-byte hash into a scalar on the given curve
    pub fn from_hash(curve: Curve, hash: &[u8; 32]) -> Result<Self> {
        match curve {
            Curve::Secp256k1 => {
                let scalar = secp_scalar_from_hash(hash);
                if bool::from(scalar.is_zero()) {
                    return Err(Error::MalformedKey("hash reduced to zero".into()));
                }
                Ok(Self::from_secp(&scalar))
            }
            Curve::Ed25519 => Self::from_bytes(curve, hash),
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Explicit copy for a holder that needs its own zeroize-on-drop instance
    pub fn duplicate(&self) -> Self {
        Self {
            curve: self.curve,
            bytes: self.bytes,
        }
    }

    /// Get the raw bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Public point `secret·G`
    pub fn public_key(&self) -> Result<PublicKey> {
        match self.curve {
            Curve::Secp256k1 => {
                let point = ProjectivePoint::GENERATOR * self.secp_scalar();
                Ok(PublicKey::Secp256k1(encode_secp_point(&point)?))
            }
            Curve::Ed25519 => {
                let point = &self.ed_scalar() * &ED25519_BASEPOINT_POINT;
                Ok(PublicKey::Ed25519(point.compress().to_bytes()))
            }
        }
    }

    /// `self + tweak (mod n)`; a zero sum is rejected
    pub(crate) fn add_tweak(&self, tweak: &[u8; 32]) -> Result<Self> {
        match self.curve {
            Curve::Secp256k1 => {
                let sum = self.secp_scalar() + secp_scalar_from_hash(tweak);
                if bool::from(sum.is_zero()) {
                    return Err(Error::MalformedKey("tweaked key is zero".into()));
                }
                Ok(Self::from_secp(&sum))
            }
            Curve::Ed25519 => {
                let sum = self.ed_scalar() + EdScalar::from_bytes_mod_order(*tweak);
                if sum == EdScalar::zero() {
                    return Err(Error::MalformedKey("tweaked key is zero".into()));
                }
                Ok(Self::from_ed(&sum))
            }
        }
    }

    pub(crate) fn secp_scalar(&self) -> SecpScalar {
        // Bytes are canonical by construction
        secp_scalar_from_hash(&self.bytes)
    }

    pub(crate) fn ed_scalar(&self) -> EdScalar {
        EdScalar::from_bytes_mod_order(self.bytes)
    }

    fn from_secp(scalar: &SecpScalar) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&scalar.to_bytes());
        Self {
            curve: Curve::Secp256k1,
            bytes,
        }
    }

    fn from_ed(scalar: &EdScalar) -> Self {
        Self {
            curve: Curve::Ed25519,
            bytes: scalar.to_bytes(),
        }
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScalar")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Key agreement and tweaks
// ============================================================================

/// `SHA256(secret·point)` - the hashed ECDH shared secret
///
/// secp256k1 hashes the affine x-coordinate; ed25519 hashes the compressed
/// point. Both sides of an exchange compute the same value.
pub(crate) fn shared_secret_hash(secret: &SecretScalar, point: &PublicKey) -> Result<[u8; 32]> {
    match secret.curve() {
        Curve::Secp256k1 => {
            if point.curve() != Curve::Secp256k1 {
                return Err(Error::CurveMismatch {
                    expected: Curve::Secp256k1,
                    actual: point.curve(),
                });
            }
            let public = k256::PublicKey::from_sec1_bytes(point.as_bytes())
                .map_err(|_| Error::MalformedKey("invalid secp256k1 point".into()))?;
            let nonzero = Option::<NonZeroScalar>::from(NonZeroScalar::new(secret.secp_scalar()))
                .ok_or_else(|| Error::MalformedKey("zero secret".into()))?;
            let shared = k256::elliptic_curve::ecdh::diffie_hellman(nonzero, public.as_affine());
            Ok(sha256(&[shared.as_bytes().as_slice()]))
        }
        Curve::Ed25519 => {
            let shared = &secret.ed_scalar() * &point.edwards_point()?;
            Ok(sha256(&[&shared.compress().to_bytes()]))
        }
    }
}

/// `point + H(tweak)·G`
pub(crate) fn tweak_public_key(point: &PublicKey, tweak: &[u8; 32]) -> Result<PublicKey> {
    match point {
        PublicKey::Secp256k1(_) => {
            let sum = point.secp_point()? + ProjectivePoint::GENERATOR * secp_scalar_from_hash(tweak);
            Ok(PublicKey::Secp256k1(encode_secp_point(&sum)?))
        }
        PublicKey::Ed25519(_) => {
            let h = EdScalar::from_bytes_mod_order(*tweak);
            let sum = point.edwards_point()? + &h * &ED25519_BASEPOINT_POINT;
            let bytes = sum.compress().to_bytes();
            decode_edwards_point(&bytes)?;
            Ok(PublicKey::Ed25519(bytes))
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// SHA-256 over the concatenation of `parts`
pub fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// 32 bytes of OS entropy
pub(crate) fn random_bytes32() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

pub(crate) fn secp_scalar_from_hash(hash: &[u8; 32]) -> SecpScalar {
    <SecpScalar as Reduce<U256>>::from_be_bytes_reduced(FieldBytes::from(*hash))
}

pub(crate) fn random_secp_scalar() -> NonZeroScalar {
    loop {
        let mut bytes = random_bytes32();
        let candidate = Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(FieldBytes::from(bytes)));
        bytes.zeroize();
        if let Some(scalar) = candidate {
            return scalar;
        }
    }
}

fn random_ed_scalar() -> EdScalar {
    loop {
        let mut bytes = random_bytes32();
        let scalar = EdScalar::from_bytes_mod_order(bytes);
        bytes.zeroize();
        if scalar != EdScalar::zero() {
            return scalar;
        }
    }
}

pub(crate) fn decode_secp_point(bytes: &[u8; SECP256K1_POINT_SIZE]) -> Result<ProjectivePoint> {
    k256::PublicKey::from_sec1_bytes(bytes)
        .map(|pk| pk.to_projective())
        .map_err(|_| Error::MalformedKey("not a point on secp256k1".into()))
}

/// Compressed SEC1 encoding; the identity has none and is rejected
pub(crate) fn encode_secp_point(point: &ProjectivePoint) -> Result<[u8; SECP256K1_POINT_SIZE]> {
    if bool::from(point.is_identity()) {
        return Err(Error::MalformedKey("identity point".into()));
    }
    let encoded = point.to_affine().to_encoded_point(true);
    encoded
        .as_bytes()
        .try_into()
        .map_err(|_| Error::MalformedKey("unexpected point encoding".into()))
}

/// Decompress an Edwards point, rejecting small-order points
pub(crate) fn decode_edwards_point(bytes: &[u8; ED25519_POINT_SIZE]) -> Result<EdwardsPoint> {
    let point = CompressedEdwardsY(*bytes)
        .decompress()
        .ok_or_else(|| Error::MalformedKey("not a point on ed25519".into()))?;
    if point.is_small_order() {
        return Err(Error::MalformedKey("small-order ed25519 point".into()));
    }
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_families_map_to_curves() {
        assert_eq!(curve_for_chain("Ethereum").unwrap(), Curve::Secp256k1);
        assert_eq!(curve_for_chain("zcash").unwrap(), Curve::Secp256k1);
        assert_eq!(curve_for_chain("near").unwrap(), Curve::Ed25519);
        assert_eq!(ChainFamily::for_chain("base").unwrap(), ChainFamily::Evm);
        assert_eq!(
            curve_for_chain("dogecoin"),
            Err(Error::UnsupportedChain("dogecoin".into()))
        );
    }

    #[test]
    fn test_chain_curve_mapping() {
        assert_eq!(Curve::for_chain("ethereum").unwrap(), Curve::Secp256k1);
        assert_eq!(Curve::for_chain("Zcash").unwrap(), Curve::Secp256k1);
        assert_eq!(Curve::for_chain("solana").unwrap(), Curve::Ed25519);
        assert_eq!(Curve::for_chain("near").unwrap(), Curve::Ed25519);
        assert!(matches!(
            Curve::for_chain("dogecoin"),
            Err(Error::UnsupportedChain(_))
        ));
    }

    #[test]
    fn test_secp_key_parsing_rejects_uncompressed_prefix() {
        let secret = SecretScalar::random(Curve::Secp256k1);
        let public = secret.public_key().unwrap();
        let mut bytes = public.to_wire_bytes();
        assert!(PublicKey::parse(Curve::Secp256k1, &bytes).is_ok());

        bytes[0] = 0x04;
        assert!(matches!(
            PublicKey::parse(Curve::Secp256k1, &bytes),
            Err(Error::MalformedKey(_))
        ));
    }

    #[test]
    fn test_secp_x_not_on_curve_rejected() {
        // x = 5 has no square root for y^2 = x^3 + 7
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        bytes[32] = 5;
        assert!(PublicKey::parse(Curve::Secp256k1, &bytes).is_err());
    }

    #[test]
    fn test_ed25519_small_order_rejected() {
        // Identity point
        let mut identity = [0u8; 32];
        identity[0] = 1;
        assert!(PublicKey::parse(Curve::Ed25519, &identity).is_err());

        // Order-2 point (0, -1)
        let mut order_2 = [0u8; 32];
        order_2[0] = 0xec;
        for b in order_2.iter_mut().take(31).skip(1) {
            *b = 0xff;
        }
        order_2[31] = 0x7f;
        assert!(PublicKey::parse(Curve::Ed25519, &order_2).is_err());
    }

    #[test]
    fn test_wire_bytes_roundtrip_both_curves() {
        for curve in [Curve::Secp256k1, Curve::Ed25519] {
            let public = SecretScalar::random(curve).public_key().unwrap();
            let wire = public.to_wire_bytes();
            assert_eq!(PublicKey::from_wire_bytes(&wire).unwrap(), public);
        }
    }

    #[test]
    fn test_shared_secret_agreement() {
        for curve in [Curve::Secp256k1, Curve::Ed25519] {
            let a = SecretScalar::random(curve);
            let b = SecretScalar::random(curve);
            let ab = shared_secret_hash(&a, &b.public_key().unwrap()).unwrap();
            let ba = shared_secret_hash(&b, &a.public_key().unwrap()).unwrap();
            assert_eq!(ab, ba);
        }
    }

    #[test]
    fn test_tweak_consistency() {
        for curve in [Curve::Secp256k1, Curve::Ed25519] {
            let secret = SecretScalar::random(curve);
            let tweak = sha256(&[b"tweak"]);
            let tweaked_secret = secret.add_tweak(&tweak).unwrap();
            let tweaked_public = tweak_public_key(&secret.public_key().unwrap(), &tweak).unwrap();
            assert_eq!(tweaked_secret.public_key().unwrap(), tweaked_public);
        }
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(SecretScalar::from_bytes(Curve::Secp256k1, &[0u8; 32]).is_err());
        assert!(SecretScalar::from_bytes(Curve::Ed25519, &[0u8; 32]).is_err());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SecretScalar::from_bytes(Curve::Ed25519, &[7u8; 32]).unwrap();
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("07"));
        assert!(rendered.contains("Ed25519"));
    }

    #[test]
    fn test_duplicate_is_an_independent_copy() {
        let secret = SecretScalar::random(Curve::Secp256k1);
        let copy = secret.duplicate();
        assert_eq!(copy.curve(), Curve::Secp256k1);
        assert_eq!(copy.as_bytes(), secret.as_bytes());
        assert!(copy.public_key().unwrap() == secret.public_key().unwrap());
        drop(secret);
        assert!(SecretScalar::from_bytes(Curve::Secp256k1, copy.as_bytes()).is_ok());
    }
}
