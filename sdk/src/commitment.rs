//! Pedersen commitments on secp256k1
//!
//! `C = v·G + r·H` where `H` is a nothing-up-my-sleeve generator: the first
//! valid even-y point whose x-coordinate is
//! `SHA256("SIP-PEDERSEN-GENERATOR-H-v1:<counter>")`. Nobody knows `log_G(H)`.
//!
//! Properties:
//! - Hiding: `C` reveals nothing about `v` without `r`
//! - Binding: no second opening under discrete-log hardness
//! - Homomorphic: `C(a, r1) + C(b, r2) = C(a + b, r1 + r2)`
//!
//! Commitments are always 33-byte compressed points. The identity point has
//! no such encoding, so zero blinding factors and sums that cancel out are
//! rejected instead of encoded.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use k256::{elliptic_curve::PrimeField, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use lazy_static::lazy_static;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::curve::{decode_secp_point, encode_secp_point, random_secp_scalar, sha256};
use crate::encoding::{from_hex_prefixed, to_hex_prefixed};
use crate::error::{Error, Result};

/// Domain separation tag for H generation
pub const H_DOMAIN: &str = "SIP-PEDERSEN-GENERATOR-H-v1";

/// Compressed commitment size
pub const COMMITMENT_SIZE: usize = 33;

lazy_static! {
    static ref H: ProjectivePoint = generate_h();
}

fn generate_h() -> ProjectivePoint {
    let mut counter: u32 = 0;
    loop {
        let x = sha256(&[format!("{}:{}", H_DOMAIN, counter).as_bytes()]);
        let mut candidate = [0u8; COMMITMENT_SIZE];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(&x);

        if let Ok(point) = decode_secp_point(&candidate) {
            if point != ProjectivePoint::GENERATOR {
                return point;
            }
        }
        counter += 1;
    }
}

/// The generators `(G, H)` in compressed form
pub fn generators() -> Result<([u8; COMMITMENT_SIZE], [u8; COMMITMENT_SIZE])> {
    Ok((
        encode_secp_point(&ProjectivePoint::GENERATOR)?,
        encode_secp_point(&H)?,
    ))
}

// ============================================================================
// Types
// ============================================================================

/// A compressed Pedersen commitment
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct Commitment(pub [u8; COMMITMENT_SIZE]);

impl Commitment {
    /// Parse and validate a compressed commitment point
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; COMMITMENT_SIZE] = bytes.try_into().map_err(|_| Error::InvalidCommitment)?;
        if arr[0] != 0x02 && arr[0] != 0x03 {
            return Err(Error::InvalidCommitment);
        }
        decode_secp_point(&arr).map_err(|_| Error::InvalidCommitment)?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(&from_hex_prefixed(s)?)
    }

    pub fn to_bytes(&self) -> [u8; COMMITMENT_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.0)
    }

    fn point(&self) -> Result<ProjectivePoint> {
        decode_secp_point(&self.0).map_err(|_| Error::InvalidCommitment)
    }

    fn from_point(point: &ProjectivePoint) -> Result<Self> {
        encode_secp_point(point)
            .map(Self)
            .map_err(|_| Error::IdentityCommitment)
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

/// A blinding factor: a canonical, non-zero secp256k1 scalar
#[derive(Clone, PartialEq, Eq)]
pub struct BlindingFactor {
    bytes: [u8; 32],
}

impl BlindingFactor {
    /// Fresh blinding factor from OS entropy
    pub fn random() -> Self {
        Self::from_scalar(random_secp_scalar().as_ref())
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        Self::scalar_from_bytes(bytes).map(|s| Self::from_scalar(&s))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes: [u8; 32] = from_hex_prefixed(s)?
            .try_into()
            .map_err(|_| Error::InvalidBlinding)?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.bytes)
    }

    fn scalar(&self) -> Scalar {
        // Validated at construction
        Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(self.bytes)))
            .unwrap_or(Scalar::ZERO)
    }

    fn scalar_from_bytes(bytes: &[u8; 32]) -> Result<Scalar> {
        Option::<NonZeroScalar>::from(NonZeroScalar::from_repr(FieldBytes::from(*bytes)))
            .map(|s| *s.as_ref())
            .ok_or(Error::InvalidBlinding)
    }

    fn from_scalar(scalar: &Scalar) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&scalar.to_bytes());
        Self { bytes }
    }

    fn from_nonzero(scalar: Scalar) -> Result<Self> {
        if bool::from(scalar.is_zero()) {
            return Err(Error::InvalidBlinding);
        }
        Ok(Self::from_scalar(&scalar))
    }
}

impl Drop for BlindingFactor {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindingFactor(..)")
    }
}

/// A commitment together with the blinding factor that opens it
#[derive(Clone, Debug)]
pub struct Opening {
    pub commitment: Commitment,
    pub blinding: BlindingFactor,
}

// ============================================================================
// Operations
// ============================================================================

/// Fresh random blinding factor
pub fn generate_blinding() -> BlindingFactor {
    BlindingFactor::random()
}

/// Commit to `value`, sampling a fresh blinding factor when none is given
pub fn commit(value: u64, blinding: Option<BlindingFactor>) -> Result<Opening> {
    let blinding = blinding.unwrap_or_else(BlindingFactor::random);
    let commitment = commit_with_blinding(value, &blinding)?;
    Ok(Opening {
        commitment,
        blinding,
    })
}

/// `C = value·G + blinding·H`
pub fn commit_with_blinding(value: u64, blinding: &BlindingFactor) -> Result<Commitment> {
    Commitment::from_point(&compute_point(value, blinding))
}

/// Commitment to zero: `C = blinding·H`
pub fn commit_zero(blinding: &BlindingFactor) -> Result<Commitment> {
    commit_with_blinding(0, blinding)
}

/// Check that `commitment` opens to `(value, blinding)` in constant time
pub fn verify_opening(commitment: &Commitment, value: u64, blinding: &BlindingFactor) -> bool {
    let expected = match encode_secp_point(&compute_point(value, blinding)) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    bool::from(expected.ct_eq(&commitment.0))
}

/// Sum of all commitments
pub fn combine(commitments: &[Commitment]) -> Result<Commitment> {
    let (first, rest) = commitments
        .split_first()
        .ok_or(Error::EmptyInput("commitments"))?;
    let mut sum = first.point()?;
    for c in rest {
        sum += c.point()?;
    }
    Commitment::from_point(&sum)
}

/// `a - b`
pub fn subtract(a: &Commitment, b: &Commitment) -> Result<Commitment> {
    Commitment::from_point(&(a.point()? - b.point()?))
}

/// Sum of blinding factors mod n
pub fn add_blindings(blindings: &[BlindingFactor]) -> Result<BlindingFactor> {
    if blindings.is_empty() {
        return Err(Error::EmptyInput("blindings"));
    }
    let sum = blindings
        .iter()
        .fold(Scalar::ZERO, |acc, b| acc + b.scalar());
    BlindingFactor::from_nonzero(sum)
}

/// `a - b mod n`
pub fn subtract_blindings(a: &BlindingFactor, b: &BlindingFactor) -> Result<BlindingFactor> {
    BlindingFactor::from_nonzero(a.scalar() - b.scalar())
}

fn compute_point(value: u64, blinding: &BlindingFactor) -> ProjectivePoint {
    ProjectivePoint::GENERATOR * Scalar::from(value) + *H * blinding.scalar()
}
