//! JSON encryption envelopes for the vault, password and portable formats.
//!
//! Binary fields are standard base64. Key names follow the files written by
//! earlier wallet releases (`v`, `alg`, `kdf`, `params`, `ct`); the long
//! names are accepted as aliases when reading.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams, SymmetricKey, ALG_AES_GCM, KDF_SCRYPT};
use crate::error::{StoreError, StoreResult};

/// Envelope version of password-derived blobs and portable backups.
pub const PASSWORD_ENVELOPE_VERSION: u32 = 2;

/// Envelope version of vault-key blobs.
pub const VAULT_ENVELOPE_VERSION: u32 = 3;

const VAULT_MODE: &str = "keyring";

/// `type` discriminator of portable backup documents.
pub const PORTABLE_TYPE: &str = "portable";

fn default_alg() -> String {
    ALG_AES_GCM.to_string()
}

/// Envelope of data sealed under the key held in the OS credential vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultEnvelope {
    #[serde(rename = "v", alias = "version")]
    version: u32,
    mode: String,
    #[serde(rename = "alg", alias = "algorithm_id", default = "default_alg")]
    algorithm: String,
    nonce: String,
    #[serde(rename = "ct", alias = "ciphertext")]
    ciphertext: String,
}

impl VaultEnvelope {
    /// Seals `plaintext` under the vault key.
    pub(crate) fn seal(key: &SymmetricKey, plaintext: &[u8]) -> StoreResult<Self> {
        let (nonce, ciphertext) = crypto::seal(key, plaintext)?;
        Ok(Self {
            version: VAULT_ENVELOPE_VERSION,
            mode: VAULT_MODE.to_string(),
            algorithm: default_alg(),
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    /// Opens the envelope. A failed authentication means the blob or the
    /// vault key was tampered with, so it is reported as corrupt data.
    pub(crate) fn open(&self, key: &SymmetricKey) -> StoreResult<Zeroizing<Vec<u8>>> {
        let nonce = STANDARD.decode(&self.nonce)?;
        let ciphertext = STANDARD.decode(&self.ciphertext)?;
        crypto::open(key, &nonce, &ciphertext)?
            .ok_or_else(|| StoreError::corrupt("vault payload failed authentication"))
    }

    pub(crate) fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|err| StoreError::Crypto(format!("envelope serialization failed: {err}")))
    }

    pub(crate) fn from_json(bytes: &[u8]) -> StoreResult<Self> {
        let envelope: Self = serde_json::from_slice(bytes)?;
        if envelope.version != VAULT_ENVELOPE_VERSION {
            return Err(StoreError::unsupported(format!(
                "vault envelope version {}",
                envelope.version
            )));
        }
        if envelope.mode != VAULT_MODE || envelope.algorithm != ALG_AES_GCM {
            return Err(StoreError::unsupported(format!(
                "vault envelope mode {} / alg {}",
                envelope.mode, envelope.algorithm
            )));
        }
        Ok(envelope)
    }
}

/// Envelope of data sealed under a password-derived key.
///
/// Also the body of a portable backup, where `kind` is set to `"portable"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordEnvelope {
    #[serde(rename = "v", alias = "version")]
    version: u32,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(rename = "alg", alias = "algorithm_id")]
    algorithm: String,
    #[serde(alias = "kdf_id")]
    kdf: String,
    #[serde(alias = "kdf_params", default)]
    params: KdfParams,
    salt: String,
    nonce: String,
    #[serde(rename = "ct", alias = "ciphertext")]
    ciphertext: String,
}

impl PasswordEnvelope {
    /// Derives a key from `password` under a fresh salt and seals `plaintext`.
    pub(crate) fn seal(
        password: &str,
        params: KdfParams,
        kind: Option<&str>,
        plaintext: &[u8],
    ) -> StoreResult<Self> {
        let salt = crypto::random_salt();
        let key = crypto::derive_key(password, &salt, params)?;
        let (nonce, ciphertext) = crypto::seal(&key, plaintext)?;
        Ok(Self {
            version: PASSWORD_ENVELOPE_VERSION,
            kind: kind.map(str::to_string),
            algorithm: default_alg(),
            kdf: KDF_SCRYPT.to_string(),
            params,
            salt: STANDARD.encode(salt),
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    /// Re-derives the key from `password` and the stored salt and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPassword`] if authentication fails.
    pub(crate) fn open(&self, password: &str) -> StoreResult<Zeroizing<Vec<u8>>> {
        let salt = STANDARD.decode(&self.salt)?;
        let nonce = STANDARD.decode(&self.nonce)?;
        let ciphertext = STANDARD.decode(&self.ciphertext)?;
        let key = crypto::derive_key(password, &salt, self.params)?;
        crypto::open(&key, &nonce, &ciphertext)?.ok_or(StoreError::InvalidPassword)
    }

    /// Returns the `type` discriminator, if present.
    pub(crate) fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns the persisted cost parameters.
    pub(crate) const fn params(&self) -> KdfParams {
        self.params
    }

    pub(crate) fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self)
            .map_err(|err| StoreError::Crypto(format!("envelope serialization failed: {err}")))
    }

    pub(crate) fn from_json(bytes: &[u8]) -> StoreResult<Self> {
        let envelope: Self = serde_json::from_slice(bytes)?;
        if envelope.version != PASSWORD_ENVELOPE_VERSION {
            return Err(StoreError::unsupported(format!(
                "password envelope version {}",
                envelope.version
            )));
        }
        if envelope.algorithm != ALG_AES_GCM || envelope.kdf != KDF_SCRYPT {
            return Err(StoreError::unsupported(format!(
                "password envelope alg {} / kdf {}",
                envelope.algorithm, envelope.kdf
            )));
        }
        Ok(envelope)
    }
}
