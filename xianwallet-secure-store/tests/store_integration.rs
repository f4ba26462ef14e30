//! End-to-end behavior of the wallet store on a real temporary directory.

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use common::{other_record, sample_record, Fixture, FAST_KDF};
use test_case::test_case;
use xianwallet_secure_store::platform::FileBlobStore;
use xianwallet_secure_store::{
    export_portable, import_portable, read_backup_file, write_backup_file, FormatTag, KdfParams,
    SecretRecord, StoreError, WalletStore,
};

#[test_case(true, true, None => FormatTag::Vault; "vault preferred")]
#[test_case(false, true, None => FormatTag::Native; "native without vault")]
#[test_case(false, false, Some("pw") => FormatTag::Password; "password fallback")]
fn test_round_trip(vault_on: bool, native_on: bool, password: Option<&str>) -> FormatTag {
    let fixture = Fixture::new(vault_on, native_on);
    let record = sample_record();

    let tag = fixture
        .store
        .save(&record, Some("http://node:26657"), password)
        .expect("save");
    assert!(fixture.store.exists());

    let (loaded, node_url) = fixture.store.load(password);
    assert_eq!(loaded, Some(record));
    assert_eq!(node_url.as_deref(), Some("http://node:26657"));

    let blob = fs::read(fixture.store_path()).expect("read store file");
    assert!(blob.starts_with(tag.magic()));
    tag
}

#[test]
fn test_correct_horse_example() {
    let fixture = Fixture::with_kdf(false, false, KdfParams::default());
    let record = sample_record();
    fixture
        .store
        .save(&record, Some("http://node:26657"), Some("correct-horse"))
        .expect("save");

    let (loaded, node_url) = fixture.store.load(Some("correct-horse"));
    assert_eq!(loaded, Some(record));
    assert_eq!(node_url.as_deref(), Some("http://node:26657"));

    assert_eq!(fixture.store.load(Some("wrong-password")), (None, None));
    match fixture.store.try_load(Some("wrong-password")) {
        Err(StoreError::InvalidPassword) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_overwrite_leaves_only_latest() {
    let fixture = Fixture::new(true, false);
    fixture
        .store
        .save(&sample_record(), Some("http://first"), None)
        .expect("first save");
    fixture
        .store
        .save(&other_record(), None, None)
        .expect("second save");

    let (loaded, node_url) = fixture.store.load(None);
    assert_eq!(loaded, Some(other_record()));
    assert_eq!(node_url, None);

    let blob = fs::read(fixture.store_path()).expect("read store file");
    assert!(!String::from_utf8_lossy(&blob).contains("http://first"));
    assert!(!FileBlobStore::temp_path(&fixture.store_path()).exists());
}

#[test]
fn test_vault_blob_readable_after_vault_disappears() {
    let fixture = Fixture::new(true, true);
    let tag = fixture
        .store
        .save(&sample_record(), None, None)
        .expect("save");
    assert_eq!(tag, FormatTag::Vault);

    // Native remains, but the file is still routed to the vault by its tag.
    fixture.vault.set_available(false);
    match fixture.store.try_load(None) {
        Err(StoreError::VaultUnavailable(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    fixture.vault.set_available(true);
    assert_eq!(fixture.store.load(None).0, Some(sample_record()));
}

#[test]
fn test_password_blob_readable_after_vault_appears() {
    let fixture = Fixture::new(false, false);
    fixture
        .store
        .save(&sample_record(), None, Some("pw"))
        .expect("save");

    fixture.vault.set_available(true);
    fixture.protector.set_available(true);
    assert!(!fixture.store.requires_password());
    assert_eq!(
        fixture.store.stored_format().expect("format"),
        Some(FormatTag::Password)
    );
    assert_eq!(fixture.store.load(Some("pw")).0, Some(sample_record()));
    assert!(fixture.vault.is_empty());
}

#[test]
fn test_vault_key_removed_is_not_regenerated() {
    let fixture = Fixture::new(true, false);
    fixture
        .store
        .save(&sample_record(), None, None)
        .expect("save");
    fixture.vault.remove("XianWallet", "wallet-key");

    match fixture.store.try_load(None) {
        Err(StoreError::VaultUnavailable(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(fixture.vault.is_empty());
}

#[test]
fn test_interrupted_write_keeps_previous_content() {
    let fixture = Fixture::new(true, false);
    fixture
        .store
        .save(&sample_record(), None, None)
        .expect("save");

    // A crash after writing the temporary file but before the rename.
    let temp = FileBlobStore::temp_path(&fixture.store_path());
    fs::write(&temp, b"XWAL3\0{\"v\":3,\"mo").expect("write partial temp");

    assert_eq!(fixture.store.load(None).0, Some(sample_record()));

    fixture
        .store
        .save(&other_record(), None, None)
        .expect("save over stale temp");
    assert!(!temp.exists());
    assert_eq!(fixture.store.load(None).0, Some(other_record()));
}

#[test]
fn test_interrupted_first_write_leaves_absence() {
    let fixture = Fixture::new(true, false);
    let temp = FileBlobStore::temp_path(&fixture.store_path());
    fs::create_dir_all(temp.parent().expect("parent")).expect("create dir");
    fs::write(&temp, b"XWAL3\0").expect("write partial temp");

    assert!(!fixture.store.exists());
    assert!(fixture.store.try_load(None).expect("load").is_none());
}

#[test_case(true, false; "vault")]
#[test_case(false, true; "native")]
fn test_key_managed_save_never_requires_password(vault_on: bool, native_on: bool) {
    let fixture = Fixture::new(vault_on, native_on);
    fixture
        .store
        .save(&sample_record(), None, None)
        .expect("save");
    assert!(!fixture.store.requires_password());
    let capabilities = fixture.store.capabilities();
    assert_eq!((capabilities.vault, capabilities.native), (vault_on, native_on));
}

#[test]
fn test_truncated_store_file_is_corrupt() {
    let fixture = Fixture::new(true, false);
    fixture
        .store
        .save(&sample_record(), None, None)
        .expect("save");
    let path = fixture.store_path();
    let blob = fs::read(&path).expect("read");
    fs::write(&path, &blob[..blob.len() / 2]).expect("truncate");

    match fixture.store.try_load(None) {
        Err(StoreError::CorruptData(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(fixture.store.load(None), (None, None));
}

#[test]
fn test_clear_then_load() {
    let fixture = Fixture::new(false, true);
    fixture
        .store
        .save(&sample_record(), None, None)
        .expect("save");
    fixture.store.clear();
    assert!(!fixture.store.exists());
    assert_eq!(fixture.store.load(None), (None, None));
    assert_eq!(fixture.store.stored_format().expect("format"), None);
}

#[test]
fn test_backup_round_trip_through_file() {
    let fixture = Fixture::new(true, false);
    let record = sample_record();
    let document = export_portable(&record, Some("http://node:26657"), "pw1").expect("export");

    let path = fixture.dir.path().join("backup.json");
    write_backup_file(&path, &document).expect("write backup");
    let document = read_backup_file(&path).expect("read backup");

    let (imported, node_url) = import_portable(&document, "pw1").expect("import");
    assert_eq!(imported, record);
    assert_eq!(node_url.as_deref(), Some("http://node:26657"));

    for _ in 0..2 {
        match import_portable(&document, "pw2") {
            Err(StoreError::InvalidPassword) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    fixture
        .store
        .save(&imported, node_url.as_deref(), None)
        .expect("save imported");
    assert_eq!(fixture.store.load(None).0, Some(record));
}

#[test]
fn test_password_blob_keeps_its_cost_parameters() {
    let cheap = KdfParams { n: 512, r: 8, p: 1 };
    let writer = Fixture::with_kdf(false, false, cheap);
    writer
        .store
        .save(&sample_record(), None, Some("pw"))
        .expect("save");
    let blob = fs::read(writer.store_path()).expect("read");

    let reader = Fixture::with_kdf(false, false, FAST_KDF);
    let path = reader.store_path();
    fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
    fs::write(&path, blob).expect("copy blob");
    assert_eq!(reader.store.load(Some("pw")).0, Some(sample_record()));
}

#[test]
fn test_oversized_stored_cost_fails_cleanly() {
    let fixture = Fixture::new(false, false);
    fixture
        .store
        .save(&sample_record(), None, Some("pw"))
        .expect("save");

    let path = fixture.store_path();
    let blob = fs::read(&path).expect("read");
    let payload = blob
        .strip_prefix(FormatTag::Password.magic())
        .expect("password tag");
    let mut envelope: serde_json::Value = serde_json::from_slice(payload).expect("json");
    envelope["params"]["n"] = (1u64 << 40).into();
    let tampered = FormatTag::Password.frame(envelope.to_string().as_bytes());
    fs::write(&path, tampered).expect("write");

    match fixture.store.try_load(Some("pw")) {
        Err(StoreError::UnsupportedFormat(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(fixture.store.load(Some("pw")), (None, None));
}

#[test]
fn test_store_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WalletStore>();

    let fixture = Fixture::new(true, false);
    let store = Arc::new(fixture.store);
    store
        .save(&sample_record(), None, None)
        .expect("first save");

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for round in 0..40 {
                let record = if round % 2 == 0 {
                    other_record()
                } else {
                    sample_record()
                };
                store.save(&record, None, None).expect("save");
            }
        })
    };
    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let expected: [SecretRecord; 2] = [sample_record(), other_record()];
            for _ in 0..40 {
                let (loaded, _) = store.load(None);
                let loaded = loaded.expect("a complete record after the first save");
                assert!(expected.contains(&loaded));
            }
        })
    };

    writer.join().expect("writer thread");
    reader.join().expect("reader thread");
    assert!(store.load(None).0.is_some());
}
