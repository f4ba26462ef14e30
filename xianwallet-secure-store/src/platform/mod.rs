//! Platform abstraction traits for the secure store.
//!
//! The store depends on three platform-provided capabilities:
//!
//! - [`AtomicBlobStore`]: crash-safe whole-file replacement
//! - [`CredentialVault`]: the OS credential vault (Keychain, Credential
//!   Manager, Secret Service)
//! - [`NativeProtector`]: the OS per-user encryption service (DPAPI)
//!
//! Production implementations live in [`file`], [`keyring`] and [`dpapi`].
//! [`memory`] provides in-process implementations used to simulate a missing
//! vault or native service in tests.

pub mod dpapi;
pub mod file;
pub mod keyring;
pub mod memory;

use std::path::Path;

use crate::error::StoreResult;

pub use self::dpapi::DpapiProtector;
pub use self::file::FileBlobStore;
pub use self::keyring::KeyringVault;

/// Atomic storage for small files.
///
/// Writes MUST use the write-to-temp-then-rename pattern so that a reader
/// always observes either the complete old content or the complete new
/// content.
pub trait AtomicBlobStore: Send + Sync {
    /// Reads the blob at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails for a reason other than absence.
    fn read(&self, path: &Path) -> StoreResult<Option<Vec<u8>>>;

    /// Atomically replaces the blob at `path` with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previous content is then
    /// left untouched.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()>;

    /// Deletes the blob at `path`. A missing blob is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for actual I/O failures.
    fn delete(&self, path: &Path) -> StoreResult<()>;

    /// Checks whether a blob exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(self.read(path)?.is_some())
    }
}

/// OS credential vault keyed by service and account identifiers.
pub trait CredentialVault: Send + Sync {
    /// Whether the vault can be reached right now.
    fn is_available(&self) -> bool;

    /// Reads the secret stored under `service`/`account`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VaultUnavailable`](crate::StoreError::VaultUnavailable)
    /// if the vault cannot be reached, or
    /// [`StoreError::Vault`](crate::StoreError::Vault) for other failures.
    fn get(&self, service: &str, account: &str) -> StoreResult<Option<String>>;

    /// Stores `secret` under `service`/`account`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Same as [`CredentialVault::get`].
    fn set(&self, service: &str, account: &str, secret: &str) -> StoreResult<()>;
}

/// OS encryption service that binds ciphertext to the current user's login.
pub trait NativeProtector: Send + Sync {
    /// Whether the service exists on this platform.
    fn is_available(&self) -> bool;

    /// Encrypts opaque bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PlatformUnavailable`](crate::StoreError::PlatformUnavailable)
    /// outside the supported OS.
    fn protect(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>>;

    /// Decrypts bytes produced by [`NativeProtector::protect`].
    ///
    /// # Errors
    ///
    /// Same as [`NativeProtector::protect`].
    fn unprotect(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>>;
}
