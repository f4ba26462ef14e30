//! Password backend: scrypt-derived key, AES-GCM, JSON envelope.

use zeroize::Zeroizing;

use crate::crypto::KdfParams;
use crate::envelope::PasswordEnvelope;
use crate::error::StoreResult;

pub(crate) fn seal(password: &str, params: KdfParams, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
    let envelope = PasswordEnvelope::seal(password, params, None, plaintext)?;
    Ok(envelope.to_json()?.into_bytes())
}

pub(crate) fn open(password: &str, payload: &[u8]) -> StoreResult<Zeroizing<Vec<u8>>> {
    PasswordEnvelope::from_json(payload)?.open(password)
}
