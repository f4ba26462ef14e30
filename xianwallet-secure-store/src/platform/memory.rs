//! In-memory implementations of the platform traits.
//!
//! These are NOT secure for production use. They exist so the store can be
//! exercised without touching the real OS vault, and so tests can simulate
//! a vault or native service that is missing or disappears at runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::crypto::{self, SymmetricKey, NONCE_SIZE};
use crate::error::{StoreError, StoreResult};

use super::{AtomicBlobStore, CredentialVault, NativeProtector};

/// In-memory credential vault with a switchable reachability flag.
pub struct MemoryVault {
    available: AtomicBool,
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryVault {
    /// Creates an empty, reachable vault.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a vault that reports itself as unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        let vault = Self::new();
        vault.set_available(false);
        vault
    }

    /// Makes the vault reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Removes an entry, as a user revoking vault access would.
    pub fn remove(&self, service: &str, account: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(service.to_string(), account.to_string()));
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::VaultUnavailable("memory vault switched off".to_string()))
        }
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialVault for MemoryVault {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn get(&self, service: &str, account: &str) -> StoreResult<Option<String>> {
        self.check_available()?;
        Ok(self
            .entries
            .lock()
            .map_err(|_| StoreError::Vault("mutex poisoned".to_string()))?
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> StoreResult<()> {
        self.check_available()?;
        self.entries
            .lock()
            .map_err(|_| StoreError::Vault("mutex poisoned".to_string()))?
            .insert((service.to_string(), account.to_string()), secret.to_string());
        Ok(())
    }
}

/// In-memory stand-in for the OS native encryption service.
///
/// Seals under a per-instance random key, so ciphertext only opens with the
/// instance that produced it, mirroring a per-user binding.
pub struct MemoryProtector {
    available: AtomicBool,
    key: SymmetricKey,
}

impl MemoryProtector {
    /// Creates an available protector with a fresh key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            key: crypto::random_key(),
        }
    }

    /// Creates a protector that reports the service as missing.
    #[must_use]
    pub fn unavailable() -> Self {
        let protector = Self::new();
        protector.set_available(false);
        protector
    }

    /// Makes the service present or missing.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::PlatformUnavailable(
                "memory protector switched off".to_string(),
            ))
        }
    }
}

impl Default for MemoryProtector {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeProtector for MemoryProtector {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn protect(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        self.check_available()?;
        let (nonce, ciphertext) = crypto::seal(&self.key, plaintext)?;
        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn unprotect(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        self.check_available()?;
        if ciphertext.len() < NONCE_SIZE {
            return Err(StoreError::corrupt("native ciphertext too short"));
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
        crypto::open(&self.key, nonce, sealed)?
            .map(|plaintext| plaintext.to_vec())
            .ok_or_else(|| StoreError::Native("decryption failed: authentication error".to_string()))
    }
}

/// In-memory atomic blob store backed by a `HashMap`.
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>>> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Lock("mutex poisoned".to_string()))
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicBlobStore for MemoryBlobStore {
    fn read(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(path).cloned())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        self.lock()?.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &Path) -> StoreResult<()> {
        self.lock()?.remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(self.lock()?.contains_key(path))
    }
}
