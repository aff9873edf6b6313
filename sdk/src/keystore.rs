//! Encrypted key storage
//!
//! Uses AES-256-GCM for encryption and Argon2id for key derivation.
//! Stealth secrets are never written in plaintext.

use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, bail, Context, Result};
use argon2::{
    password_hash::{rand_core::RngCore, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroize;

use crate::stealth::StealthKeys;

/// Current key file format version
const KEY_FILE_VERSION: u8 = 1;

/// Argon2id cost parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB memory
            iterations: 3,
            lanes: 4,
        }
    }
}

impl KdfParams {
    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = argon2::Params::new(self.memory_kib, self.iterations, self.lanes, Some(32))
            .map_err(|e| anyhow!("Argon2 params error: {}", e))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

/// Encrypted key file format
#[derive(Serialize, Deserialize)]
pub struct EncryptedKeyFile {
    pub version: u8,
    pub kdf: KdfParams,
    /// Salt for Argon2
    pub salt: String,
    /// Nonce for AES-GCM (base64)
    pub nonce: String,
    /// Encrypted key data (base64)
    pub ciphertext: String,
    /// PHC string used to reject a wrong password before decrypting
    pub password_hash: Option<String>,
    pub created_at: String,
}

/// Plaintext key material (internal use only)
#[derive(Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct KeyData {
    pub chain: String,
    pub spending_secret: [u8; 32],
    pub viewing_secret: [u8; 32],
}

impl KeyData {
    pub fn from_keys(keys: &StealthKeys) -> Self {
        let (spending_secret, viewing_secret) = keys.export_secrets();
        Self {
            chain: keys.meta_address().chain.clone(),
            spending_secret,
            viewing_secret,
        }
    }

    pub fn to_keys(&self) -> crate::Result<StealthKeys> {
        StealthKeys::from_secrets(&self.chain, &self.spending_secret, &self.viewing_secret)
    }
}

impl EncryptedKeyFile {
    /// Encrypt key data with a password
    pub fn encrypt(data: &KeyData, password: &str, kdf: KdfParams) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = kdf.argon2()?;

        let mut key_bytes = [0u8; 32];
        argon2
            .hash_password_into(password.as_bytes(), salt.as_str().as_bytes(), &mut key_bytes)
            .map_err(|e| anyhow!("Key derivation failed: {}", e))?;

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| anyhow!("Cipher creation failed: {}", e));
        key_bytes.zeroize();
        let cipher = cipher?;

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let mut plaintext = serde_json::to_vec(data)?;
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| anyhow!("Encryption failed: {}", e));
        plaintext.zeroize();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .ok()
            .map(|h| h.to_string());

        Ok(Self {
            version: KEY_FILE_VERSION,
            kdf,
            salt: salt.as_str().to_string(),
            nonce: b64::encode(&nonce_bytes),
            ciphertext: b64::encode(&ciphertext?),
            password_hash,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Decrypt key data with a password
    pub fn decrypt(&self, password: &str) -> Result<KeyData> {
        if self.version != KEY_FILE_VERSION {
            bail!("Unsupported key file version {}", self.version);
        }

        if let Some(ref hash) = self.password_hash {
            let parsed_hash = argon2::PasswordHash::new(hash)
                .map_err(|e| anyhow!("Invalid password hash: {}", e))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .map_err(|_| anyhow!("Invalid password"))?;
        }

        let mut key_bytes = [0u8; 32];
        self.kdf
            .argon2()?
            .hash_password_into(password.as_bytes(), self.salt.as_bytes(), &mut key_bytes)
            .map_err(|e| anyhow!("Key derivation failed: {}", e))?;

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| anyhow!("Cipher creation failed: {}", e));
        key_bytes.zeroize();
        let cipher = cipher?;

        let nonce_bytes = b64::decode(&self.nonce).context("Invalid nonce encoding")?;
        let ciphertext = b64::decode(&self.ciphertext).context("Invalid ciphertext encoding")?;

        let nonce_array: [u8; 12] = nonce_bytes
            .try_into()
            .map_err(|_| anyhow!("Invalid nonce length"))?;
        let nonce = Nonce::from(nonce_array);

        let mut plaintext = cipher
            .decrypt(&nonce, ciphertext.as_ref())
            .map_err(|_| anyhow!("Decryption failed - wrong password or corrupted data"))?;

        let data = serde_json::from_slice::<KeyData>(&plaintext)
            .context("Failed to parse decrypted key data");
        plaintext.zeroize();
        data
    }
}

/// Password-protected key file on disk
pub struct Keystore {
    path: PathBuf,
    kdf: KdfParams,
}

impl Keystore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            kdf: KdfParams::default(),
        }
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// `~/.sip/keys.enc`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sip").join("keys.enc"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Encrypt and write keys with owner-only permissions
    pub fn save(&self, data: &KeyData, password: &str) -> Result<()> {
        let encrypted = EncryptedKeyFile::encrypt(data, password, self.kdf)?;
        let json = serde_json::to_string_pretty(&encrypted)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(&self.path, &json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %self.path.display(), "saved encrypted stealth keys");
        Ok(())
    }

    pub fn load(&self, password: &str) -> Result<KeyData> {
        let json = fs::read_to_string(&self.path).context("Failed to read encrypted key file")?;
        let encrypted: EncryptedKeyFile =
            serde_json::from_str(&json).context("Failed to parse encrypted key file")?;
        encrypted.decrypt(password)
    }

    /// Save a key set
    pub fn save_keys(&self, keys: &StealthKeys, password: &str) -> Result<()> {
        self.save(&KeyData::from_keys(keys), password)
    }

    pub fn load_keys(&self, password: &str) -> Result<StealthKeys> {
        Ok(self.load(password)?.to_keys()?)
    }

    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        validate_password_strength(new_password)?;
        let data = self.load(old_password)?;
        self.save(&data, new_password)
    }

    /// Delete stored keys (requires password confirmation)
    pub fn delete(&self, password: &str) -> Result<()> {
        let _ = self.load(password)?;
        fs::remove_file(&self.path)?;
        info!(path = %self.path.display(), "deleted stealth keys");
        Ok(())
    }
}

/// Shortest password accepted for a new key file
pub const MIN_PASSWORD_LEN: usize = 8;

/// Reject passwords that are too short or miss a character class
///
/// The error names every missing class at once.
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password needs at least {} characters", MIN_PASSWORD_LEN);
    }

    let classes: [(&str, fn(char) -> bool); 3] = [
        ("an uppercase letter", char::is_uppercase),
        ("a lowercase letter", char::is_lowercase),
        ("a digit", char::is_numeric),
    ];
    let missing: Vec<&str> = classes
        .iter()
        .filter(|(_, present)| !password.chars().any(present))
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        bail!("Password is missing {}", missing.join(", "));
    }
    Ok(())
}

mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    pub fn decode(s: &str) -> anyhow::Result<Vec<u8>> {
        STANDARD
            .decode(s)
            .map_err(|e| anyhow::anyhow!("Base64 decode error: {}", e))
    }
}
