//! Error types for the wallet secure store.

use thiserror::Error;

/// Result type for secure store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the secure store and its backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The OS native encryption service does not exist on this platform.
    #[error("platform unavailable: {0}")]
    PlatformUnavailable(String),

    /// The OS credential vault cannot be reached, or holds no wallet key.
    #[error("vault unavailable: {0}")]
    VaultUnavailable(String),

    /// The vault was reachable but the operation failed.
    #[error("vault error: {0}")]
    Vault(String),

    /// The native encryption service reported a failure.
    #[error("native encryption error: {0}")]
    Native(String),

    /// The password backend was selected but no password was supplied.
    #[error("a password is required on this system")]
    MissingPassword,

    /// Authentication failed under a password-derived key.
    #[error("invalid password")]
    InvalidPassword,

    /// Unknown format tag, envelope version, algorithm, KDF or document type.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed encoding or a payload that failed authentication.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// A secret record that violates its invariants.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Failures of the KDF or AEAD primitives themselves.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Filesystem failures.
    #[error("I/O error during {context}: {source}")]
    Io {
        /// The operation that failed.
        context: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The store mutex was poisoned by a panicking holder.
    #[error("store lock error: {0}")]
    Lock(String),
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn corrupt(context: impl Into<String>) -> Self {
        Self::CorruptData(context.into())
    }

    pub(crate) fn unsupported(context: impl Into<String>) -> Self {
        Self::UnsupportedFormat(context.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptData(format!("json: {err}"))
    }
}

impl From<base64::DecodeError> for StoreError {
    fn from(err: base64::DecodeError) -> Self {
        Self::CorruptData(format!("base64: {err}"))
    }
}
