//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::error::StoreResult;
use crate::paths::StorePaths;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "XIANWALLET_DATA_DIR";

/// Default vault service identifier of the wallet key.
pub const DEFAULT_VAULT_SERVICE: &str = "XianWallet";

/// Default vault account identifier of the wallet key.
pub const DEFAULT_VAULT_ACCOUNT: &str = "wallet-key";

/// Configuration of a [`WalletStore`](crate::WalletStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory holding `XianWallet/`. Defaults to the per-user data directory.
    pub data_dir: Option<PathBuf>,
    /// Vault service identifier of the wallet key.
    pub vault_service: String,
    /// Vault account identifier of the wallet key.
    pub vault_account: String,
    /// scrypt cost for newly written password blobs. Existing blobs keep
    /// the parameters they were written with.
    pub password_kdf: KdfParams,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            vault_service: DEFAULT_VAULT_SERVICE.to_string(),
            vault_account: DEFAULT_VAULT_ACCOUNT.to_string(),
            password_kdf: KdfParams::default(),
        }
    }
}

impl StoreConfig {
    /// Defaults, with `data_dir` taken from `XIANWALLET_DATA_DIR` when set.
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            data_dir,
            ..Self::default()
        }
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Sets the scrypt cost for new password blobs.
    #[must_use]
    pub const fn with_password_kdf(mut self, params: KdfParams) -> Self {
        self.password_kdf = params;
        self
    }

    /// Resolves the store paths.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory is configured and the platform
    /// has none for the current user.
    pub fn paths(&self) -> StoreResult<StorePaths> {
        self.data_dir
            .as_ref()
            .map_or_else(StorePaths::per_user, |dir| Ok(StorePaths::new(dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.vault_service, "XianWallet");
        assert_eq!(config.vault_account, "wallet-key");
        assert_eq!(config.password_kdf, KdfParams::default());
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"data_dir": "/srv/wallet", "password_kdf": {"n": 32768}}"#)
                .expect("config");
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/wallet")));
        assert_eq!(config.password_kdf, KdfParams { n: 32_768, r: 8, p: 1 });
        assert_eq!(config.vault_account, "wallet-key");
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let config = StoreConfig::default().with_data_dir("/srv/wallet");
        let paths = config.paths().expect("paths");
        assert_eq!(
            paths.store_path(),
            PathBuf::from("/srv/wallet/XianWallet/wallet_store.bin")
        );
    }
}
