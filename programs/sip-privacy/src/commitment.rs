//! On-chain Pedersen commitment checks
//!
//! Same curve and generators as the client library: `C = v·G + r·H` over
//! secp256k1, with `H` the first valid even-y point whose x-coordinate is
//! `SHA256("SIP-PEDERSEN-GENERATOR-H-v1:<counter>")`.

use anchor_lang::solana_program::hash::hashv;
use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, PublicKey, Scalar};

use crate::COMMITMENT_SIZE;

const H_DOMAIN: &str = "SIP-PEDERSEN-GENERATOR-H-v1";

/// Decode a compressed point; `None` for anything but `0x02`/`0x03` + valid x
pub fn parse_commitment(bytes: &[u8; COMMITMENT_SIZE]) -> Option<ProjectivePoint> {
    if bytes[0] != 0x02 && bytes[0] != 0x03 {
        return None;
    }
    PublicKey::from_sec1_bytes(bytes)
        .ok()
        .map(|pk| pk.to_projective())
}

pub fn is_valid_commitment(bytes: &[u8; COMMITMENT_SIZE]) -> bool {
    parse_commitment(bytes).is_some()
}

/// The blinding generator `H`
pub fn generator_h() -> ProjectivePoint {
    let mut counter: u32 = 0;
    loop {
        let label = format!("{}:{}", H_DOMAIN, counter);
        let mut candidate = [0u8; COMMITMENT_SIZE];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(&hashv(&[label.as_bytes()]).to_bytes());

        if let Some(point) = parse_commitment(&candidate) {
            if point != ProjectivePoint::GENERATOR {
                return point;
            }
        }
        counter += 1;
    }
}

pub fn encode_point(point: &ProjectivePoint) -> Option<[u8; COMMITMENT_SIZE]> {
    if bool::from(point.is_identity()) {
        return None;
    }
    point
        .to_affine()
        .to_encoded_point(true)
        .as_bytes()
        .try_into()
        .ok()
}

/// True when `value·G + blinding·H` encodes to `commitment`
///
/// A blinding factor that is zero or not a canonical scalar never opens
/// anything.
pub fn verify_opening(commitment: &[u8; COMMITMENT_SIZE], value: u64, blinding: &[u8; 32]) -> bool {
    let r = match Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*blinding))) {
        Some(r) if !bool::from(r.is_zero()) => r,
        _ => return false,
    };
    let point = ProjectivePoint::GENERATOR * Scalar::from(value) + generator_h() * r;
    encode_point(&point).map_or(false, |expected| expected == *commitment)
}
