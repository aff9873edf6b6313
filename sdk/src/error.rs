//! Error types for the SIP client SDK

use thiserror::Error;

use crate::curve::Curve;

/// Result alias used throughout the SDK
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Keys and curves
    // ========================================================================
    #[error("Unsupported chain '{0}' - no curve configured")]
    UnsupportedChain(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Curve mismatch - expected {expected}, got {actual}")]
    CurveMismatch { expected: Curve, actual: Curve },

    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    // ========================================================================
    // Commitments
    // ========================================================================
    #[error("Invalid blinding factor - must be a non-zero canonical scalar")]
    InvalidBlinding,

    #[error("Invalid commitment - not a compressed secp256k1 point")]
    InvalidCommitment,

    #[error("Commitment combination is the identity point")]
    IdentityCommitment,

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    // ========================================================================
    // Viewing keys
    // ========================================================================
    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Invalid validity window - starts at {valid_from} but ends at {valid_until}")]
    InvalidWindow { valid_from: i64, valid_until: i64 },

    #[error("Encryption failed")]
    EncryptionFailed,

    /// Every decrypt refusal (window, scope, tag mismatch) collapses into this
    #[error("Decryption failed")]
    DecryptionFailed,

    // ========================================================================
    // Signing and scanning
    // ========================================================================
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Announcement source error: {0}")]
    Source(String),

    // ========================================================================
    // Intent boundary
    // ========================================================================
    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Attestation rejected: {0}")]
    AttestationRejected(&'static str),
}
