//! Common test utilities shared across integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use xianwallet_secure_store::platform::memory::{MemoryProtector, MemoryVault};
use xianwallet_secure_store::platform::FileBlobStore;
use xianwallet_secure_store::{KdfParams, SecretRecord, StoreConfig, WalletStore};

/// Cheap scrypt cost for tests that do not exercise the defaults.
#[allow(dead_code, reason = "used in tests")]
pub const FAST_KDF: KdfParams = KdfParams { n: 1024, r: 8, p: 1 };

/// A store on a real temporary directory with switchable vault and native service.
pub struct Fixture {
    pub store: WalletStore,
    pub vault: Arc<MemoryVault>,
    pub protector: Arc<MemoryProtector>,
    pub dir: TempDir,
}

/// Routes library logs to the test harness. `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Fixture {
    pub fn new(vault_on: bool, native_on: bool) -> Self {
        Self::with_kdf(vault_on, native_on, FAST_KDF)
    }

    pub fn with_kdf(vault_on: bool, native_on: bool, kdf: KdfParams) -> Self {
        init_logging();
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = Arc::new(MemoryVault::new());
        vault.set_available(vault_on);
        let protector = Arc::new(MemoryProtector::new());
        protector.set_available(native_on);
        let config = StoreConfig::default()
            .with_data_dir(dir.path())
            .with_password_kdf(kdf);
        let store = WalletStore::new_with_components(
            config,
            Arc::new(FileBlobStore::new()),
            vault.clone(),
            protector.clone(),
        )
        .expect("store");
        Self {
            store,
            vault,
            protector,
            dir,
        }
    }

    #[allow(dead_code, reason = "used in tests")]
    pub fn store_path(&self) -> PathBuf {
        self.store.store_path().expect("store path")
    }
}

#[allow(dead_code, reason = "used in tests")]
pub fn sample_record() -> SecretRecord {
    let words = [
        "abandon", "ability", "able", "about", "above", "absent", "absorb", "abstract",
        "absurd", "abuse", "access", "accident", "account", "accuse", "achieve", "acid",
        "acoustic", "acquire", "across", "act", "action", "actor", "actress", "actual",
    ];
    SecretRecord::new("ab".repeat(32), "cd".repeat(32), Some(words.join(" ")))
        .expect("record")
}

#[allow(dead_code, reason = "used in tests")]
pub fn other_record() -> SecretRecord {
    SecretRecord::new("01".repeat(32), "23".repeat(32), None).expect("record")
}
