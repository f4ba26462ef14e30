//! Portable backups: password-sealed JSON documents that open on any machine.
//!
//! A backup is a password envelope with `"type": "portable"`, always written
//! with the default scrypt cost so it stays importable regardless of the
//! exporting installation's configuration.

use std::path::Path;

use crate::crypto::KdfParams;
use crate::envelope::{PasswordEnvelope, PORTABLE_TYPE};
use crate::error::{StoreError, StoreResult};
use crate::platform::{AtomicBlobStore, FileBlobStore};
use crate::record::{self, SecretRecord};

/// Seals the wallet into a portable backup document.
///
/// # Errors
///
/// Returns an error if key derivation or encryption fails.
pub fn export_portable(
    record: &SecretRecord,
    node_url: Option<&str>,
    password: &str,
) -> StoreResult<String> {
    let plaintext = record::encode_payload(record, node_url)?;
    let envelope =
        PasswordEnvelope::seal(password, KdfParams::default(), Some(PORTABLE_TYPE), &plaintext)?;
    envelope.to_json()
}

/// Opens a portable backup document.
///
/// Documents without a `type` field are accepted.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPassword`] on a wrong password,
/// [`StoreError::UnsupportedFormat`] for an unknown type, version or
/// algorithm, or [`StoreError::CorruptData`] for a malformed document.
pub fn import_portable(
    document: &str,
    password: &str,
) -> StoreResult<(SecretRecord, Option<String>)> {
    let envelope = PasswordEnvelope::from_json(document.as_bytes())?;
    match envelope.kind() {
        None | Some(PORTABLE_TYPE) => {}
        Some(other) => {
            return Err(StoreError::unsupported(format!("backup type {other}")));
        }
    }
    let params = envelope.params();
    tracing::debug!(n = params.n, r = params.r, p = params.p, "opening portable backup");
    let plaintext = envelope.open(password)?;
    record::decode_payload(&plaintext)
}

/// Atomically writes a backup document to `path`.
///
/// # Errors
///
/// Returns an I/O error if the write fails.
pub fn write_backup_file(path: &Path, document: &str) -> StoreResult<()> {
    FileBlobStore::new().write_atomic(path, document.as_bytes())?;
    tracing::info!(path = %path.display(), "wrote portable backup");
    Ok(())
}

/// Reads a backup document from `path`.
///
/// # Errors
///
/// Returns an I/O error if the file is missing or unreadable, or
/// [`StoreError::CorruptData`] if it is not UTF-8.
pub fn read_backup_file(path: &Path) -> StoreResult<String> {
    let bytes = FileBlobStore::new().read(path)?.ok_or_else(|| {
        StoreError::io(
            format!("read '{}'", path.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "backup file not found"),
        )
    })?;
    String::from_utf8(bytes).map_err(|_| StoreError::corrupt("backup file is not UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SecretRecord {
        SecretRecord::new("aa11", "bb22", None).expect("record")
    }

    #[test]
    fn test_export_uses_default_cost() {
        let document = export_portable(&record(), Some("http://node"), "pw").expect("export");
        let value: serde_json::Value = serde_json::from_str(&document).expect("json");
        assert_eq!(value["type"], "portable");
        assert_eq!(value["v"], 2);
        assert_eq!(value["params"]["n"], 16_384);
        assert_eq!(value["params"]["r"], 8);
        assert_eq!(value["params"]["p"], 1);

        let (imported, node_url) = import_portable(&document, "pw").expect("import");
        assert_eq!(imported, record());
        assert_eq!(node_url.as_deref(), Some("http://node"));
    }

    #[test]
    fn test_import_rejects_foreign_type() {
        let document = export_portable(&record(), None, "pw").expect("export");
        let mut value: serde_json::Value = serde_json::from_str(&document).expect("json");
        value["type"] = "cloud".into();
        match import_portable(&value.to_string(), "pw") {
            Err(StoreError::UnsupportedFormat(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_import_accepts_untyped_document() {
        let document = export_portable(&record(), None, "pw").expect("export");
        let mut value: serde_json::Value = serde_json::from_str(&document).expect("json");
        value.as_object_mut().expect("object").remove("type");
        let (imported, _) = import_portable(&value.to_string(), "pw").expect("import");
        assert_eq!(imported, record());
    }

    #[test]
    fn test_import_rejects_oversized_cost() {
        let document = export_portable(&record(), None, "pw").expect("export");
        let mut value: serde_json::Value = serde_json::from_str(&document).expect("json");
        value["params"]["n"] = (1u64 << 40).into();
        match import_portable(&value.to_string(), "pw") {
            Err(StoreError::UnsupportedFormat(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_import_garbage() {
        match import_portable("not json", "pw") {
            Err(StoreError::CorruptData(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_backup_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("backups").join("wallet.json");
        write_backup_file(&path, "{\"v\":2}").expect("write");
        assert_eq!(read_backup_file(&path).expect("read"), "{\"v\":2}");
    }

    #[test]
    fn test_read_missing_backup_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        match read_backup_file(&dir.path().join("missing.json")) {
            Err(StoreError::Io { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_read_non_utf8_backup_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wallet.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");
        match read_backup_file(&path) {
            Err(StoreError::CorruptData(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
