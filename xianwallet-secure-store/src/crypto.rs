//! AES-256-GCM sealing and scrypt key derivation shared by the vault,
//! password and portable backup formats.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{StoreError, StoreResult};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the scrypt salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of the GCM authentication tag in bytes.
const TAG_SIZE: usize = 16;

/// Algorithm identifier written into every envelope.
pub const ALG_AES_GCM: &str = "AESGCM";

/// KDF identifier written into password and portable envelopes.
pub const KDF_SCRYPT: &str = "scrypt";

/// Upper bound on the scrypt working set (`128 * r * n` bytes) accepted
/// from stored or imported parameters.
pub const MAX_SCRYPT_MEMORY: u64 = 32 * 1024 * 1024;

/// Upper bound on the scrypt parallelism parameter.
pub const MAX_SCRYPT_P: u32 = 16;

/// A 256-bit symmetric key, wiped on drop.
pub type SymmetricKey = Zeroizing<[u8; KEY_SIZE]>;

/// scrypt cost parameters, persisted alongside each password-derived blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// CPU/memory cost. Must be a power of two greater than one.
    #[serde(default = "default_n")]
    pub n: u64,
    /// Block size.
    #[serde(default = "default_r")]
    pub r: u32,
    /// Parallelism.
    #[serde(default = "default_p")]
    pub p: u32,
}

const fn default_n() -> u64 {
    16_384
}

const fn default_r() -> u32 {
    8
}

const fn default_p() -> u32 {
    1
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            n: default_n(),
            r: default_r(),
            p: default_p(),
        }
    }
}

impl KdfParams {
    /// Rejects parameters scrypt cannot run within [`MAX_SCRYPT_MEMORY`]
    /// and [`MAX_SCRYPT_P`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedFormat`] for out-of-range parameters.
    pub fn check_bounds(self) -> StoreResult<()> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(StoreError::unsupported(format!(
                "scrypt n must be a power of two greater than 1, got {}",
                self.n
            )));
        }
        if self.r == 0 || self.p == 0 || self.p > MAX_SCRYPT_P {
            return Err(StoreError::unsupported(format!(
                "scrypt r/p out of range: r={}, p={}",
                self.r, self.p
            )));
        }
        let memory = 128u64
            .checked_mul(u64::from(self.r))
            .and_then(|bytes| bytes.checked_mul(self.n))
            .filter(|bytes| *bytes <= MAX_SCRYPT_MEMORY);
        if memory.is_none() {
            return Err(StoreError::unsupported(format!(
                "scrypt n={} r={} exceeds the {MAX_SCRYPT_MEMORY} byte memory limit",
                self.n, self.r
            )));
        }
        Ok(())
    }

    fn to_scrypt(self) -> StoreResult<scrypt::Params> {
        self.check_bounds()?;
        #[allow(clippy::cast_possible_truncation)]
        let log_n = self.n.trailing_zeros() as u8;
        scrypt::Params::new(log_n, self.r, self.p, KEY_SIZE)
            .map_err(|err| StoreError::unsupported(format!("invalid scrypt params: {err}")))
    }
}

/// Derives an AES key from `password` and `salt` with scrypt.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedFormat`] if the cost parameters are not
/// accepted by scrypt.
pub fn derive_key(password: &str, salt: &[u8], params: KdfParams) -> StoreResult<SymmetricKey> {
    let scrypt_params = params.to_scrypt()?;
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    scrypt::scrypt(password.as_bytes(), salt, &scrypt_params, &mut *key)
        .map_err(|err| StoreError::Crypto(format!("scrypt failed: {err}")))?;
    Ok(key)
}

/// Generates a fresh random key.
#[must_use]
pub fn random_key() -> SymmetricKey {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut *key);
    key
}

/// Generates a fresh random scrypt salt.
#[must_use]
pub fn random_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn new_cipher(key: &[u8; KEY_SIZE]) -> StoreResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|err| StoreError::Crypto(format!("invalid AES key: {err}")))
}

fn random_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypts `plaintext` under `key` with a fresh nonce and no associated data.
///
/// Returns `(nonce, ciphertext || tag)`.
///
/// # Errors
///
/// Returns [`StoreError::Crypto`] if the cipher refuses the input.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> StoreResult<([u8; NONCE_SIZE], Vec<u8>)> {
    let cipher = new_cipher(key)?;
    let nonce = random_nonce();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| StoreError::Crypto("AES-GCM encryption failed".to_string()))?;
    Ok((nonce, ciphertext))
}

/// Decrypts and authenticates `ciphertext` under `key`.
///
/// Returns `None` when authentication fails, so each caller can map that
/// outcome to its own error kind (wrong password versus tampered blob).
///
/// # Errors
///
/// Returns [`StoreError::CorruptData`] if the nonce or ciphertext have
/// impossible lengths.
pub fn open(
    key: &[u8; KEY_SIZE],
    nonce: &[u8],
    ciphertext: &[u8],
) -> StoreResult<Option<Zeroizing<Vec<u8>>>> {
    if nonce.len() != NONCE_SIZE {
        return Err(StoreError::corrupt(format!(
            "nonce length mismatch: expected {NONCE_SIZE}, got {}",
            nonce.len()
        )));
    }
    if ciphertext.len() < TAG_SIZE {
        return Err(StoreError::corrupt(format!(
            "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
            ciphertext.len()
        )));
    }
    let cipher = new_cipher(key)?;
    Ok(cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .ok()
        .map(Zeroizing::new))
}
