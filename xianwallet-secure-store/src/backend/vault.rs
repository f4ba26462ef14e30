//! Vault backend: a random AES key lives in the OS credential vault and the
//! payload is a [`VaultEnvelope`] sealed under it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::crypto::{self, SymmetricKey, KEY_SIZE};
use crate::envelope::VaultEnvelope;
use crate::error::{StoreError, StoreResult};
use crate::platform::CredentialVault;

/// Where the wallet key lives in the vault.
pub(crate) struct VaultKeyRef<'a> {
    pub vault: &'a dyn CredentialVault,
    pub service: &'a str,
    pub account: &'a str,
}

impl VaultKeyRef<'_> {
    fn fetch(&self) -> StoreResult<Option<SymmetricKey>> {
        let Some(encoded) = self.vault.get(self.service, self.account)? else {
            return Ok(None);
        };
        let encoded = Zeroizing::new(encoded);
        let bytes = Zeroizing::new(STANDARD.decode(encoded.trim())?);
        let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            StoreError::corrupt(format!(
                "vault key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Some(Zeroizing::new(key)))
    }

    /// Returns the stored key, generating and storing one on first use.
    fn get_or_create(&self) -> StoreResult<SymmetricKey> {
        if let Some(key) = self.fetch()? {
            return Ok(key);
        }
        let key = crypto::random_key();
        let encoded = Zeroizing::new(STANDARD.encode(*key));
        self.vault.set(self.service, self.account, &encoded)?;
        tracing::info!(service = self.service, "generated new wallet key in vault");
        Ok(key)
    }

    /// Returns the stored key. Never generates one.
    fn require(&self) -> StoreResult<SymmetricKey> {
        self.fetch()?.ok_or_else(|| {
            StoreError::VaultUnavailable(format!(
                "no wallet key under {}/{}",
                self.service, self.account
            ))
        })
    }
}

pub(crate) fn seal(key_ref: &VaultKeyRef<'_>, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
    let key = key_ref.get_or_create()?;
    VaultEnvelope::seal(&key, plaintext)?.to_json()
}

pub(crate) fn open(key_ref: &VaultKeyRef<'_>, payload: &[u8]) -> StoreResult<Zeroizing<Vec<u8>>> {
    let envelope = VaultEnvelope::from_json(payload)?;
    let key = key_ref.require()?;
    envelope.open(&key)
}
