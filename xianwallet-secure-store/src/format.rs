//! Store file format tags and backend selection.
//!
//! The store file is `[format_tag][payload]`. Loading dispatches on the tag
//! alone, so a file stays readable after the runtime capabilities change.

use crate::error::{StoreError, StoreResult};

/// Tag of blobs sealed by the OS native user encryption service.
pub const MAGIC_NATIVE: &[u8] = b"XWAL1\0";

/// Tag of blobs sealed under a password-derived key.
pub const MAGIC_PASSWORD: &[u8] = b"XWAL2\0";

/// Tag of blobs sealed under the key held in the OS credential vault.
pub const MAGIC_VAULT: &[u8] = b"XWAL3\0";

/// Backend that produced a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// OS native per-user encryption.
    Native,
    /// AES-GCM under a vault-held key.
    Vault,
    /// AES-GCM under a scrypt password-derived key.
    Password,
}

impl FormatTag {
    /// Returns the leading byte sequence identifying this format.
    #[must_use]
    pub const fn magic(self) -> &'static [u8] {
        match self {
            Self::Native => MAGIC_NATIVE,
            Self::Vault => MAGIC_VAULT,
            Self::Password => MAGIC_PASSWORD,
        }
    }

    /// Splits a stored blob into its tag and payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedFormat`] if no known tag leads the blob.
    pub fn sniff(blob: &[u8]) -> StoreResult<(Self, &[u8])> {
        [Self::Vault, Self::Native, Self::Password]
            .into_iter()
            .find_map(|tag| blob.strip_prefix(tag.magic()).map(|payload| (tag, payload)))
            .ok_or_else(|| StoreError::unsupported("unknown wallet store format tag"))
    }

    /// Prefixes `payload` with this tag.
    #[must_use]
    pub fn frame(self, payload: &[u8]) -> Vec<u8> {
        let magic = self.magic();
        let mut out = Vec::with_capacity(magic.len() + payload.len());
        out.extend_from_slice(magic);
        out.extend_from_slice(payload);
        out
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Native => "native",
            Self::Vault => "vault",
            Self::Password => "password",
        };
        f.write_str(name)
    }
}

/// Encryption facilities usable in the current runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Capabilities {
    /// The OS credential vault is reachable.
    pub vault: bool,
    /// The OS native user encryption service exists.
    pub native: bool,
}

impl Capabilities {
    /// Whether saving needs a password, i.e. no key-managing facility exists.
    #[must_use]
    pub const fn requires_password(self) -> bool {
        !self.vault && !self.native
    }
}

/// Chooses the backend for a save: vault, then native, then password.
///
/// # Errors
///
/// Returns [`StoreError::MissingPassword`] if only the password backend is
/// usable and no password was supplied.
pub fn select_backend(capabilities: Capabilities, has_password: bool) -> StoreResult<FormatTag> {
    if capabilities.vault {
        Ok(FormatTag::Vault)
    } else if capabilities.native {
        Ok(FormatTag::Native)
    } else if has_password {
        Ok(FormatTag::Password)
    } else {
        Err(StoreError::MissingPassword)
    }
}
