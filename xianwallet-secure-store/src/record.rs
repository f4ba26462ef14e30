//! Wallet secret record and the plaintext payload every backend encrypts.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{StoreError, StoreResult};

/// Secret material of a single wallet.
///
/// The record is produced by the wallet-cryptography layer and is treated as
/// opaque here: keys and mnemonic are never parsed or validated beyond the
/// presence invariant. Fields are wiped when the record is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretRecord {
    private_key: String,
    public_key: String,
    mnemonic: Option<String>,
}

impl SecretRecord {
    /// Builds a record.
    ///
    /// An empty mnemonic is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if exactly one of the two keys is empty.
    pub fn new(
        private_key: impl Into<String>,
        public_key: impl Into<String>,
        mnemonic: Option<String>,
    ) -> StoreResult<Self> {
        let private_key = private_key.into();
        let public_key = public_key.into();
        if private_key.is_empty() != public_key.is_empty() {
            return Err(StoreError::InvalidRecord(
                "private and public key must both be present or both be absent".to_string(),
            ));
        }
        Ok(Self {
            private_key,
            public_key,
            mnemonic: mnemonic.filter(|words| !words.is_empty()),
        })
    }

    /// Returns the private key. Treat this as sensitive material.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Returns the public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns the recovery phrase, if the wallet was derived from one.
    #[must_use]
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_deref()
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    private_key: &'a str,
    public_key: &'a str,
    mnemonic: Option<&'a str>,
    node_url: &'a str,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct PayloadOwned {
    #[serde(default)]
    private_key: String,
    #[serde(default)]
    public_key: String,
    #[serde(default)]
    mnemonic: Option<String>,
    #[serde(default)]
    node_url: Option<String>,
}

/// Serializes a record and node URL into the JSON plaintext sealed by the backends.
pub(crate) fn encode_payload(
    record: &SecretRecord,
    node_url: Option<&str>,
) -> StoreResult<Zeroizing<Vec<u8>>> {
    let payload = PayloadRef {
        private_key: &record.private_key,
        public_key: &record.public_key,
        mnemonic: record.mnemonic.as_deref(),
        node_url: node_url.unwrap_or_default(),
    };
    serde_json::to_vec(&payload)
        .map(Zeroizing::new)
        .map_err(|err| StoreError::Crypto(format!("payload serialization failed: {err}")))
}

/// Parses decrypted plaintext back into a record and node URL.
pub(crate) fn decode_payload(plaintext: &[u8]) -> StoreResult<(SecretRecord, Option<String>)> {
    let payload: PayloadOwned = serde_json::from_slice(plaintext)?;
    let record = SecretRecord::new(
        payload.private_key.clone(),
        payload.public_key.clone(),
        payload.mnemonic.clone(),
    )
    .map_err(|err| StoreError::corrupt(err.to_string()))?;
    let node_url = payload.node_url.clone().filter(|url| !url.is_empty());
    Ok((record, node_url))
}
