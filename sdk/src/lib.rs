//! SIP client SDK
//!
//! Client-side cryptography for shielded transfers:
//! - [`curve`]: secp256k1 and ed25519 keys behind one [`PublicKey`] type
//! - [`commitment`]: Pedersen commitments over secp256k1
//! - [`stealth`]: one-time addresses with view tags
//! - [`viewing`]: the HKDF viewing-key hierarchy and XChaCha20-Poly1305 envelopes
//! - [`scanner`]: pull-based, restartable announcement scanning
//! - [`keystore`] and [`config`]: encrypted key files and client settings

pub mod commitment;
pub mod config;
pub mod curve;
pub mod encoding;
pub mod error;
pub mod intent;
pub mod keystore;
pub mod nullifier;
pub mod scanner;
pub mod signer;
pub mod stealth;
pub mod viewing;

pub use commitment::{BlindingFactor, Commitment, Opening};
pub use curve::{curve_for_chain, ChainFamily, Curve, PublicKey, SecretScalar};
pub use error::{Error, Result};
pub use scanner::{Announcement, AnnouncementSource, ScanPage, Scanner};
pub use signer::StealthSigner;
pub use stealth::{
    derive_stealth_address, public_key_to_eth_address, ScanOutcome, StealthAddress, StealthKeys,
    StealthMetaAddress,
};
pub use viewing::{PrivacyLevel, ViewingKey};

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod tests;


#[cfg(test)]
mod test_vectors;
