//! Native backend: the OS service owns the key and the ciphertext format,
//! so the payload is just its output, base64 wrapped.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::error::StoreResult;
use crate::platform::NativeProtector;

pub(crate) fn seal(protector: &dyn NativeProtector, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
    let sealed = protector.protect(plaintext)?;
    Ok(STANDARD.encode(sealed).into_bytes())
}

pub(crate) fn open(protector: &dyn NativeProtector, payload: &[u8]) -> StoreResult<Zeroizing<Vec<u8>>> {
    let sealed = STANDARD.decode(payload.trim_ascii())?;
    protector.unprotect(&sealed).map(Zeroizing::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::platform::memory::MemoryProtector;

    #[test]
    fn test_round_trip() {
        let protector = MemoryProtector::new();
        let payload = seal(&protector, b"wallet").expect("seal");
        assert!(payload.iter().all(u8::is_ascii));
        assert_eq!(open(&protector, &payload).expect("open").as_slice(), b"wallet");
    }

    #[test]
    fn test_missing_service() {
        let protector = MemoryProtector::unavailable();
        match seal(&protector, b"wallet") {
            Err(StoreError::PlatformUnavailable(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_base64() {
        let protector = MemoryProtector::new();
        match open(&protector, b"%%%") {
            Err(StoreError::CorruptData(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
