//! Wallet store facade: backend selection on save, tag dispatch on load.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use zeroize::Zeroizing;

use crate::backend::vault::VaultKeyRef;
use crate::backend::{native, password, vault};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::format::{select_backend, Capabilities, FormatTag};
use crate::paths::StorePaths;
use crate::platform::{
    AtomicBlobStore, CredentialVault, DpapiProtector, FileBlobStore, KeyringVault,
    NativeProtector,
};
use crate::record::{self, SecretRecord};

/// Record and node URL read back from the store.
pub type LoadedWallet = (SecretRecord, Option<String>);

/// Persistent, encrypted storage of a single wallet's secrets.
///
/// The store file is fully replaced on every save and always carries the tag
/// of the backend that wrote it, so it can be read back after the vault or
/// native service availability changes.
pub struct WalletStore {
    inner: Mutex<WalletStoreInner>,
}

impl std::fmt::Debug for WalletStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletStore").finish()
    }
}

struct WalletStoreInner {
    paths: StorePaths,
    config: StoreConfig,
    blob_store: Arc<dyn AtomicBlobStore>,
    vault: Arc<dyn CredentialVault>,
    protector: Arc<dyn NativeProtector>,
}

impl WalletStore {
    /// Opens the store with the OS vault, native service and filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the store paths cannot be resolved.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let vault = Arc::new(KeyringVault::new(config.vault_service.clone()));
        Self::new_with_components(
            config,
            Arc::new(FileBlobStore::new()),
            vault,
            Arc::new(DpapiProtector::new()),
        )
    }

    /// Opens the store with explicit platform components.
    ///
    /// # Errors
    ///
    /// Returns an error if the store paths cannot be resolved.
    pub fn new_with_components(
        config: StoreConfig,
        blob_store: Arc<dyn AtomicBlobStore>,
        vault: Arc<dyn CredentialVault>,
        protector: Arc<dyn NativeProtector>,
    ) -> StoreResult<Self> {
        let paths = config.paths()?;
        Ok(Self {
            inner: Mutex::new(WalletStoreInner {
                paths,
                config,
                blob_store,
                vault,
                protector,
            }),
        })
    }

    /// Encrypts and persists the wallet, replacing any stored one.
    ///
    /// Backend priority is vault, then native, then password.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingPassword`] if only the password backend
    /// is usable and `password` is `None`, or the backend or write failure.
    pub fn save(
        &self,
        record: &SecretRecord,
        node_url: Option<&str>,
        password: Option<&str>,
    ) -> StoreResult<FormatTag> {
        self.lock_inner()?.save(record, node_url, password)
    }

    /// Loads the stored wallet.
    ///
    /// Absence and every failure both yield `(None, None)`; failures are
    /// logged. Use [`WalletStore::try_load`] to tell them apart.
    #[must_use]
    pub fn load(&self, password: Option<&str>) -> (Option<SecretRecord>, Option<String>) {
        match self.try_load(password) {
            Ok(Some((record, node_url))) => (Some(record), node_url),
            Ok(None) => (None, None),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load wallet store");
                (None, None)
            }
        }
    }

    /// Loads the stored wallet, reporting failures precisely.
    ///
    /// The backend is chosen by the stored format tag, not by the current
    /// platform capabilities.
    ///
    /// # Errors
    ///
    /// Returns the precise failure: [`StoreError::InvalidPassword`],
    /// [`StoreError::MissingPassword`], [`StoreError::VaultUnavailable`],
    /// [`StoreError::PlatformUnavailable`], [`StoreError::UnsupportedFormat`],
    /// [`StoreError::CorruptData`] or an I/O error.
    pub fn try_load(&self, password: Option<&str>) -> StoreResult<Option<LoadedWallet>> {
        self.lock_inner()?.try_load(password)
    }

    /// Whether a store file exists. Read failures count as absent.
    #[must_use]
    pub fn exists(&self) -> bool {
        let result = self
            .lock_inner()
            .and_then(|inner| inner.blob_store.exists(&inner.paths.store_path()));
        result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to check wallet store");
            false
        })
    }

    /// Deletes the store file. Best effort: failures are logged, a missing
    /// file is fine. The vault key is left in place.
    pub fn clear(&self) {
        let result = self.lock_inner().and_then(|inner| inner.clear());
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to clear wallet store");
        }
    }

    /// Whether saving needs a password on this system.
    #[must_use]
    pub fn requires_password(&self) -> bool {
        self.capabilities().requires_password()
    }

    /// Probes the vault and native service.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        match self.lock_inner() {
            Ok(inner) => inner.capabilities(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to probe capabilities");
                Capabilities::default()
            }
        }
    }

    /// Returns the format of the stored file without decrypting it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedFormat`] for an unknown tag, or an
    /// I/O error.
    pub fn stored_format(&self) -> StoreResult<Option<FormatTag>> {
        let Some(blob) = self.lock_inner()?.read_blob()? else {
            return Ok(None);
        };
        FormatTag::sniff(&blob).map(|(tag, _)| Some(tag))
    }

    /// Returns the path of the store file.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn store_path(&self) -> StoreResult<PathBuf> {
        self.lock_inner().map(|inner| inner.paths.store_path())
    }

    fn lock_inner(&self) -> StoreResult<MutexGuard<'_, WalletStoreInner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Lock("wallet store mutex poisoned".to_string()))
    }
}

impl WalletStoreInner {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            vault: self.vault.is_available(),
            native: self.protector.is_available(),
        }
    }

    fn vault_key(&self) -> VaultKeyRef<'_> {
        VaultKeyRef {
            vault: self.vault.as_ref(),
            service: &self.config.vault_service,
            account: &self.config.vault_account,
        }
    }

    fn read_blob(&self) -> StoreResult<Option<Zeroizing<Vec<u8>>>> {
        Ok(self
            .blob_store
            .read(&self.paths.store_path())?
            .map(Zeroizing::new))
    }

    fn save(
        &self,
        record: &SecretRecord,
        node_url: Option<&str>,
        password: Option<&str>,
    ) -> StoreResult<FormatTag> {
        let tag = select_backend(self.capabilities(), password.is_some())?;
        tracing::debug!(format = %tag, "selected wallet store backend");

        let plaintext = record::encode_payload(record, node_url)?;
        let payload = match tag {
            FormatTag::Vault => vault::seal(&self.vault_key(), &plaintext)?,
            FormatTag::Native => native::seal(self.protector.as_ref(), &plaintext)?,
            FormatTag::Password => {
                let password = password.ok_or(StoreError::MissingPassword)?;
                password::seal(password, self.config.password_kdf, &plaintext)?
            }
        };

        let path = self.paths.store_path();
        self.blob_store.write_atomic(&path, &tag.frame(&payload))?;
        tracing::info!(format = %tag, path = %path.display(), "saved wallet store");
        Ok(tag)
    }

    fn try_load(&self, password: Option<&str>) -> StoreResult<Option<LoadedWallet>> {
        let Some(blob) = self.read_blob()? else {
            tracing::debug!("no wallet store file");
            return Ok(None);
        };
        let (tag, payload) = FormatTag::sniff(&blob)?;
        tracing::debug!(format = %tag, "loading wallet store");

        let plaintext = match tag {
            FormatTag::Vault => vault::open(&self.vault_key(), payload)?,
            FormatTag::Native => native::open(self.protector.as_ref(), payload)?,
            FormatTag::Password => {
                let password = password.ok_or(StoreError::MissingPassword)?;
                password::open(password, payload)?
            }
        };
        record::decode_payload(&plaintext).map(Some)
    }

    fn clear(&self) -> StoreResult<()> {
        let path = self.paths.store_path();
        self.blob_store.delete(&path)?;
        tracing::info!(path = %path.display(), "cleared wallet store");
        Ok(())
    }
}
