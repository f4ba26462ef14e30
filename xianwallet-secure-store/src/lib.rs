//! Encrypted on-disk storage of Xian wallet secrets.
//!
//! A single store file per installation holds the wallet's private key,
//! public key, optional recovery phrase and optional node URL. The file is
//! sealed by the best facility the platform offers:
//!
//! * **Vault**: a random AES-256-GCM key kept in the OS credential vault
//!   (Keychain, Credential Manager, Secret Service).
//! * **Native**: the OS per-user encryption service (Windows DPAPI).
//! * **Password**: AES-256-GCM under a scrypt key derived from a user password.
//!
//! Every file starts with a format tag naming the backend that wrote it, so
//! it reads back through the same backend even if availability changed in
//! between. Writes replace the file atomically.
//!
//! [`export_portable`] and [`import_portable`] produce and consume a
//! password-sealed JSON backup that opens on any platform.
//!
//! ```no_run
//! use xianwallet_secure_store::{SecretRecord, StoreConfig, WalletStore};
//!
//! # fn main() -> Result<(), xianwallet_secure_store::StoreError> {
//! let store = WalletStore::open(StoreConfig::from_env())?;
//! let record = SecretRecord::new("e3b0...", "9f86...", None)?;
//! store.save(&record, Some("https://node.xian.org"), None)?;
//! let (loaded, node_url) = store.load(None);
//! # let _ = (loaded, node_url);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod backend;
pub mod backup;
pub mod config;
pub mod crypto;
mod envelope;
pub mod error;
pub mod format;
pub mod paths;
pub mod platform;
mod record;
pub mod store;

pub use backup::{export_portable, import_portable, read_backup_file, write_backup_file};
pub use config::StoreConfig;
pub use crypto::KdfParams;
pub use error::{StoreError, StoreResult};
pub use format::{select_backend, Capabilities, FormatTag};
pub use paths::StorePaths;
pub use record::SecretRecord;
pub use store::{LoadedWallet, WalletStore};
