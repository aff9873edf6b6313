//! Viewing keys
//!
//! ```text
//! Master ──"full"──► Full ──"auditor:all"──► Auditor(*) ──"label:<l>"──► Auditor(l) ──"transfer:<hash>"──► Transaction
//! ```
//!
//! Each child is `HKDF-SHA256(parent, "SIP-VIEWING-KEY-v1" || context)`, so
//! any ancestor can recompute a descendant and no descendant can recover an
//! ancestor. A payload is sealed under the Transaction-level key of its
//! `(label, transfer_hash)` pair with XChaCha20-Poly1305; the transfer hash
//! is the AAD, so a ciphertext cannot be replayed onto another transfer.
//!
//! The ledger's `encrypted_amount` is such a payload in compact form
//! (`nonce || ct`), and the record's `viewing_key_hash` is the hash of the
//! label-level key, which is the narrowest key able to open every transfer
//! under that label.
//!
//! Auditor and Transaction keys carry a validity window and a scope. Both
//! are evaluated, without short-circuiting, before any key derivation or
//! AEAD work; every refusal is the same [`Error::DecryptionFailed`].
//!
//! The second half of the module is the asymmetric path: a sender who only
//! knows the recipient's viewing public key runs ECDH, then HKDF, then the
//! same AEAD.

use chacha20poly1305::{
    aead::{Aead, NewAead, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq, ConstantTimeLess};
use zeroize::{Zeroize, Zeroizing};

use crate::curve::{random_bytes32, sha256, shared_secret_hash, PublicKey, SecretScalar};
use crate::error::{Error, Result};

/// Domain tag mixed into every viewing-key derivation
pub const VIEWING_KEY_DOMAIN: &[u8] = b"SIP-VIEWING-KEY-v1";

const ENCRYPTION_DOMAIN: &[u8] = b"SIP-VIEWING-ENCRYPTION-v1";
const TRANSFER_HASH_DOMAIN: &[u8] = b"SIP-TRANSFER-HASH-v1";

/// XChaCha20 nonce size
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size
pub const TAG_SIZE: usize = 16;

/// Sealed on-ledger amount: nonce + u64 + tag
pub const SEALED_AMOUNT_SIZE: usize = NONCE_SIZE + 8 + TAG_SIZE;

// ============================================================================
// Derivation
// ============================================================================

/// `child = HKDF-SHA256(parent, domain || context)`
pub fn derive_key(parent: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(Some(VIEWING_KEY_DOMAIN), parent);
    let mut info = Vec::with_capacity(VIEWING_KEY_DOMAIN.len() + context.len());
    info.extend_from_slice(VIEWING_KEY_DOMAIN);
    info.extend_from_slice(context.as_bytes());

    let mut okm = [0u8; 32];
    hk.expand(&info, &mut okm)
        .map_err(|_| Error::KeyDerivation)?;
    Ok(okm)
}

const AUDITOR_ALL_CONTEXT: &str = "auditor:all";

fn label_context(label: &str) -> String {
    format!("label:{}", label)
}

fn transfer_context(transfer_hash: &[u8; 32]) -> String {
    format!("transfer:{}", hex::encode(transfer_hash))
}

/// Unique hash of a transfer, computable by the sender before submission
pub fn transfer_hash(commitment: &[u8; 33], stealth_address: &[u8], ephemeral_public_key: &[u8; 33]) -> [u8; 32] {
    sha256(&[
        TRANSFER_HASH_DOMAIN,
        commitment,
        stealth_address,
        ephemeral_public_key,
    ])
}

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewingKeyKind {
    Master,
    Full,
    Auditor,
    Transaction,
}

/// What a key may decrypt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    All,
    Label(String),
    Transfer([u8; 32]),
}

/// Inclusive unix-second window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub valid_from: i64,
    pub valid_until: i64,
}

impl ValidityWindow {
    pub fn new(valid_from: i64, valid_until: i64) -> Result<Self> {
        if valid_from > valid_until {
            return Err(Error::InvalidWindow {
                valid_from,
                valid_until,
            });
        }
        Ok(Self {
            valid_from,
            valid_until,
        })
    }

    fn contains(&self, now: i64) -> Choice {
        // Shift into u64 so the comparison is order-preserving
        let now = (now as u64) ^ (1 << 63);
        let from = (self.valid_from as u64) ^ (1 << 63);
        let until = (self.valid_until as u64) ^ (1 << 63);
        !now.ct_lt(&from) & !until.ct_lt(&now)
    }
}

/// A payload sealed under a viewing key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    pub label: String,
    pub transfer_hash: [u8; 32],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// `nonce || ciphertext`; label and hash are known from context
    pub fn to_compact(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_compact(label: &str, transfer_hash: &[u8; 32], bytes: &[u8]) -> Result<Self> {
        let (nonce, ciphertext) = split_compact(bytes)?;
        Ok(Self {
            label: label.to_string(),
            transfer_hash: *transfer_hash,
            nonce,
            ciphertext,
        })
    }
}

/// A node of the viewing-key hierarchy
///
/// Not Clone: derived keys are independent values with their own lifetime.
pub struct ViewingKey {
    kind: ViewingKeyKind,
    key: [u8; 32],
    scope: Scope,
    window: Option<ValidityWindow>,
}

impl ViewingKey {
    /// Fresh master key from OS entropy
    pub fn generate_master() -> Self {
        Self::master_from_bytes(random_bytes32())
    }

    pub fn master_from_bytes(key: [u8; 32]) -> Self {
        Self {
            kind: ViewingKeyKind::Master,
            key,
            scope: Scope::All,
            window: None,
        }
    }

    /// Master key bound to a stealth viewing secret, so one backup covers both
    pub fn master_from_viewing_secret(secret: &SecretScalar) -> Result<Self> {
        Ok(Self::master_from_bytes(derive_key(secret.as_bytes(), "master")?))
    }

    pub fn kind(&self) -> ViewingKeyKind {
        self.kind
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn window(&self) -> Option<ValidityWindow> {
        self.window
    }

    /// Get the raw key bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// SHA-256 of the key
    pub fn key_hash(&self) -> [u8; 32] {
        viewing_key_hash(&self.key)
    }

    /// Hash published on a transfer record sealed under `label`
    ///
    /// Equals `key_hash()` of any auditor key scoped to that label.
    pub fn record_key_hash(&self, label: &str) -> Result<[u8; 32]> {
        Ok(viewing_key_hash(&*self.label_key(label)?))
    }

    /// Full viewing key; only a master key can produce one
    pub fn derive_full(&self) -> Result<Self> {
        if self.kind != ViewingKeyKind::Master {
            return Err(Error::KeyDerivation);
        }
        Ok(Self {
            kind: ViewingKeyKind::Full,
            key: derive_key(&self.key, "full")?,
            scope: Scope::All,
            window: None,
        })
    }

    /// Time-limited auditor key, for one label or (with `None`) everything
    pub fn derive_auditor(&self, label: Option<&str>, window: ValidityWindow) -> Result<Self> {
        let (key, scope) = match label {
            Some(label) => (*self.label_key(label)?, Scope::Label(label.to_string())),
            None => (*self.auditor_all_material()?, Scope::All),
        };
        Ok(Self {
            kind: ViewingKeyKind::Auditor,
            key,
            scope,
            window: Some(window),
        })
    }

    /// Key that opens exactly one transfer
    pub fn derive_transaction(&self, label: &str, transfer_hash: &[u8; 32], window: ValidityWindow) -> Result<Self> {
        if !bool::from(self.covers(label, transfer_hash)) {
            return Err(Error::KeyDerivation);
        }
        Ok(Self {
            kind: ViewingKeyKind::Transaction,
            key: *self.content_key(label, transfer_hash)?,
            scope: Scope::Transfer(*transfer_hash),
            window: Some(window),
        })
    }

    /// Seal `payload` for the `(label, transfer_hash)` record
    pub fn encrypt(&self, label: &str, transfer_hash: &[u8; 32], payload: &[u8]) -> Result<SealedEnvelope> {
        if !bool::from(self.covers(label, transfer_hash)) {
            return Err(Error::EncryptionFailed);
        }
        let key = self.content_key(label, transfer_hash)?;
        let (nonce, ciphertext) = aead_seal(&key, payload, transfer_hash)?;
        Ok(SealedEnvelope {
            label: label.to_string(),
            transfer_hash: *transfer_hash,
            nonce,
            ciphertext,
        })
    }

    /// Open an envelope at time `now`
    pub fn decrypt(&self, envelope: &SealedEnvelope, now: i64) -> Result<Vec<u8>> {
        let in_window = match &self.window {
            Some(window) => window.contains(now),
            None => Choice::from(1),
        };
        let in_scope = self.covers(&envelope.label, &envelope.transfer_hash);
        if !bool::from(in_window & in_scope) {
            return Err(Error::DecryptionFailed);
        }

        let key = self
            .content_key(&envelope.label, &envelope.transfer_hash)
            .map_err(|_| Error::DecryptionFailed)?;
        aead_open(&key, &envelope.nonce, &envelope.ciphertext, &envelope.transfer_hash)
    }

    /// [`Self::decrypt`] against the system clock
    pub fn decrypt_now(&self, envelope: &SealedEnvelope) -> Result<Vec<u8>> {
        self.decrypt(envelope, chrono::Utc::now().timestamp())
    }

    /// Seal a transfer amount into the 48-byte ledger `encrypted_amount`
    pub fn seal_amount(&self, label: &str, transfer_hash: &[u8; 32], amount: u64) -> Result<Vec<u8>> {
        Ok(self
            .encrypt(label, transfer_hash, &amount.to_le_bytes())?
            .to_compact())
    }

    /// Recover an amount sealed by [`Self::seal_amount`]
    ///
    /// Subject to the same window and scope checks as [`Self::decrypt`].
    pub fn open_amount(&self, label: &str, transfer_hash: &[u8; 32], sealed: &[u8], now: i64) -> Result<u64> {
        if sealed.len() != SEALED_AMOUNT_SIZE {
            return Err(Error::DecryptionFailed);
        }
        let envelope = SealedEnvelope::from_compact(label, transfer_hash, sealed)?;
        let plaintext = Zeroizing::new(self.decrypt(&envelope, now)?);
        let bytes: [u8; 8] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| Error::DecryptionFailed)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Key material of the all-scope auditor level
    fn auditor_all_material(&self) -> Result<Zeroizing<[u8; 32]>> {
        match (self.kind, &self.scope) {
            (ViewingKeyKind::Master, _) => {
                let full = Zeroizing::new(derive_key(&self.key, "full")?);
                Ok(Zeroizing::new(derive_key(&full, AUDITOR_ALL_CONTEXT)?))
            }
            (ViewingKeyKind::Full, _) => {
                Ok(Zeroizing::new(derive_key(&self.key, AUDITOR_ALL_CONTEXT)?))
            }
            (ViewingKeyKind::Auditor, Scope::All) => Ok(Zeroizing::new(self.key)),
            _ => Err(Error::KeyDerivation),
        }
    }

    fn label_key(&self, label: &str) -> Result<Zeroizing<[u8; 32]>> {
        match (self.kind, &self.scope) {
            (ViewingKeyKind::Auditor, Scope::Label(_)) => {
                if !bool::from(self.covers(label, &[0u8; 32])) {
                    return Err(Error::KeyDerivation);
                }
                Ok(Zeroizing::new(self.key))
            }
            _ => {
                let all = self.auditor_all_material()?;
                Ok(Zeroizing::new(derive_key(&all, &label_context(label))?))
            }
        }
    }

    fn covers(&self, label: &str, transfer_hash: &[u8; 32]) -> Choice {
        match &self.scope {
            Scope::All => Choice::from(1),
            Scope::Label(own) => sha256(&[own.as_bytes()]).ct_eq(&sha256(&[label.as_bytes()])),
            Scope::Transfer(own) => own.ct_eq(transfer_hash),
        }
    }

    fn content_key(&self, label: &str, transfer_hash: &[u8; 32]) -> Result<Zeroizing<[u8; 32]>> {
        if self.kind == ViewingKeyKind::Transaction {
            return Ok(Zeroizing::new(self.key));
        }
        let label_key = self.label_key(label)?;
        Ok(Zeroizing::new(derive_key(&label_key, &transfer_context(transfer_hash))?))
    }
}

impl Drop for ViewingKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for ViewingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKey")
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// SHA-256 of raw viewing key bytes
pub fn viewing_key_hash(key: &[u8]) -> [u8; 32] {
    sha256(&[key])
}

// ============================================================================
// Asymmetric encryption to a viewing public key
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub ephemeral_public_key: PublicKey,
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// `nonce || ciphertext`, for when the ephemeral key is stored elsewhere
    pub fn to_compact(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_compact(ephemeral_public_key: PublicKey, bytes: &[u8]) -> Result<Self> {
        let (nonce, ciphertext) = split_compact(bytes)?;
        Ok(Self {
            ephemeral_public_key,
            nonce,
            ciphertext,
        })
    }
}

/// ECDH with a fresh ephemeral key, then HKDF, then XChaCha20-Poly1305
pub fn encrypt(payload: &[u8], viewing_public_key: &PublicKey, transfer_hash: &[u8; 32]) -> Result<EncryptedBlob> {
    let ephemeral = SecretScalar::random(viewing_public_key.curve());
    encrypt_with_ephemeral(payload, viewing_public_key, &ephemeral, transfer_hash)
}

/// Encrypt reusing an existing ephemeral secret (e.g. the stealth `r`)
pub fn encrypt_with_ephemeral(
    payload: &[u8],
    viewing_public_key: &PublicKey,
    ephemeral_secret: &SecretScalar,
    transfer_hash: &[u8; 32],
) -> Result<EncryptedBlob> {
    let ephemeral_public_key = ephemeral_secret.public_key()?;
    let shared = Zeroizing::new(shared_secret_hash(ephemeral_secret, viewing_public_key)?);
    let key = encryption_key(&shared, &ephemeral_public_key)?;
    let (nonce, ciphertext) = aead_seal(&key, payload, transfer_hash)?;
    Ok(EncryptedBlob {
        ephemeral_public_key,
        nonce,
        ciphertext,
    })
}

/// Inverse of [`encrypt`]; any failure is [`Error::DecryptionFailed`]
pub fn decrypt(blob: &EncryptedBlob, viewing_secret: &SecretScalar, transfer_hash: &[u8; 32]) -> Result<Vec<u8>> {
    let shared = shared_secret_hash(viewing_secret, &blob.ephemeral_public_key)
        .map(Zeroizing::new)
        .map_err(|_| Error::DecryptionFailed)?;
    let key = encryption_key(&shared, &blob.ephemeral_public_key)
        .map_err(|_| Error::DecryptionFailed)?;
    aead_open(&key, &blob.nonce, &blob.ciphertext, transfer_hash)
}

fn encryption_key(shared: &[u8; 32], ephemeral_public_key: &PublicKey) -> Result<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(Some(ENCRYPTION_DOMAIN), shared);
    let mut info = ENCRYPTION_DOMAIN.to_vec();
    info.extend_from_slice(&ephemeral_public_key.to_wire_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(&info, &mut key[..])
        .map_err(|_| Error::KeyDerivation)?;
    Ok(key)
}

// ============================================================================
// AEAD
// ============================================================================

fn split_compact(bytes: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>)> {
    if bytes.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed);
    }
    let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
    let mut nonce_arr = [0u8; NONCE_SIZE];
    nonce_arr.copy_from_slice(nonce);
    Ok((nonce_arr, ciphertext.to_vec()))
}

fn aead_seal(key: &[u8; 32], payload: &[u8], aad: &[u8; 32]) -> Result<([u8; NONCE_SIZE], Vec<u8>)> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), Payload { msg: payload, aad })
        .map_err(|_| Error::EncryptionFailed)?;
    Ok((nonce, ciphertext))
}

fn aead_open(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8], aad: &[u8; 32]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| Error::DecryptionFailed)
}

// ============================================================================
// Privacy levels
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    /// Amount and recipient in the clear
    Transparent,
    /// Commitment + stealth recipient, no auditor access
    #[default]
    Shielded,
    /// Shielded, with metadata sealed for a viewing key
    Compliant,
}

impl PrivacyLevel {
    pub fn should_encrypt(&self) -> bool {
        !matches!(self, PrivacyLevel::Transparent)
    }

    pub fn should_include_viewing_key(&self) -> bool {
        matches!(self, PrivacyLevel::Compliant)
    }
}
