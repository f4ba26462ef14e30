//! OS credential vault backed by the `keyring` crate.
//!
//! Dispatches to:
//!   - Linux: Secret Service over D-Bus (GNOME Keyring / KDE Wallet)
//!   - macOS: Security.framework Keychain
//!   - Windows: Windows Credential Manager

use crate::error::{StoreError, StoreResult};

use super::CredentialVault;

/// Probe entry used to check reachability without touching the wallet key.
const PROBE_ACCOUNT: &str = "availability-probe";

/// [`CredentialVault`] over the platform keyring.
#[derive(Debug, Clone)]
pub struct KeyringVault {
    probe_service: String,
}

impl KeyringVault {
    /// Creates a vault whose availability probe looks up an entry of
    /// `probe_service`.
    #[must_use]
    pub fn new(probe_service: impl Into<String>) -> Self {
        Self {
            probe_service: probe_service.into(),
        }
    }

    fn entry(service: &str, account: &str) -> StoreResult<keyring::Entry> {
        keyring::Entry::new(service, account).map_err(map_keyring_err)
    }
}

fn map_keyring_err(err: keyring::Error) -> StoreError {
    match err {
        keyring::Error::NoStorageAccess(inner) | keyring::Error::PlatformFailure(inner) => {
            StoreError::VaultUnavailable(inner.to_string())
        }
        other => StoreError::Vault(other.to_string()),
    }
}

impl CredentialVault for KeyringVault {
    fn is_available(&self) -> bool {
        match Self::entry(&self.probe_service, PROBE_ACCOUNT).and_then(|entry| {
            match entry.get_password() {
                Ok(_) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(err) => Err(map_keyring_err(err)),
            }
        }) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!("credential vault unavailable: {err}");
                false
            }
        }
    }

    fn get(&self, service: &str, account: &str) -> StoreResult<Option<String>> {
        match Self::entry(service, account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(map_keyring_err(err)),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> StoreResult<()> {
        Self::entry(service, account)?
            .set_password(secret)
            .map_err(map_keyring_err)
    }
}
