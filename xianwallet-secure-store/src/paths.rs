//! Store path helpers.

use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

const APP_DIR_NAME: &str = "XianWallet";
const STORE_FILENAME: &str = "wallet_store.bin";

/// Paths for wallet store artifacts under `<root>/XianWallet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
    app_dir: PathBuf,
}

impl StorePaths {
    /// Builds store paths rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let app_dir = root.join(APP_DIR_NAME);
        Self { root, app_dir }
    }

    /// Builds store paths under the per-user data directory: `%APPDATA%` on
    /// Windows, `~/.local/share` on every other platform (macOS included, so
    /// wallets written by earlier releases keep resolving).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform reports no data directory for the
    /// current user.
    pub fn per_user() -> StoreResult<Self> {
        per_user_root().map(Self::new).ok_or_else(|| {
            StoreError::io(
                "resolve per-user data directory",
                std::io::Error::new(std::io::ErrorKind::NotFound, "no data directory for this user"),
            )
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the application directory.
    #[must_use]
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Returns the path to the encrypted wallet store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.app_dir.join(STORE_FILENAME)
    }
}

#[cfg(windows)]
fn per_user_root() -> Option<PathBuf> {
    dirs::data_dir()
}

#[cfg(not(windows))]
fn per_user_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".local").join("share"))
}
