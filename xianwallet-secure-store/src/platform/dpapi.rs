//! Native per-user encryption.
//!
//! On Windows this is DPAPI (`CryptProtectData` / `CryptUnprotectData`),
//! which binds ciphertext to the logged-in user's credentials. Every other
//! platform reports the service as unavailable.

use crate::error::{StoreError, StoreResult};

use super::NativeProtector;

/// [`NativeProtector`] over the Windows Data Protection API.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpapiProtector;

impl DpapiProtector {
    /// Creates the protector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

// Windows: DPAPI through crypt32

#[cfg(windows)]
mod imp {
    use super::*;
    use std::ffi::c_void;
    use std::ptr;

    #[repr(C)]
    struct DataBlob {
        cb_data: u32,
        pb_data: *mut u8,
    }

    const CRYPTPROTECT_UI_FORBIDDEN: u32 = 0x1;

    #[link(name = "crypt32")]
    extern "system" {
        fn CryptProtectData(
            data_in: *const DataBlob,
            data_descr: *const u16,
            optional_entropy: *const DataBlob,
            reserved: *mut c_void,
            prompt_struct: *const c_void,
            flags: u32,
            data_out: *mut DataBlob,
        ) -> i32;
        fn CryptUnprotectData(
            data_in: *const DataBlob,
            data_descr: *mut *mut u16,
            optional_entropy: *const DataBlob,
            reserved: *mut c_void,
            prompt_struct: *const c_void,
            flags: u32,
            data_out: *mut DataBlob,
        ) -> i32;
    }

    #[link(name = "kernel32")]
    extern "system" {
        fn LocalFree(mem: *mut c_void) -> *mut c_void;
    }

    fn input_blob(data: &[u8]) -> StoreResult<DataBlob> {
        let len = u32::try_from(data.len())
            .map_err(|_| StoreError::Native("payload exceeds 4 GiB".to_string()))?;
        Ok(DataBlob {
            cb_data: len,
            pb_data: data.as_ptr().cast_mut(),
        })
    }

    /// Copies the system-allocated output and releases it with `LocalFree`.
    fn take_output(blob: &DataBlob) -> Vec<u8> {
        if blob.pb_data.is_null() {
            return Vec::new();
        }
        let out =
            unsafe { std::slice::from_raw_parts(blob.pb_data, blob.cb_data as usize) }.to_vec();
        unsafe {
            LocalFree(blob.pb_data.cast());
        }
        out
    }

    pub fn protect(plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        let input = input_blob(plaintext)?;
        let mut output = DataBlob {
            cb_data: 0,
            pb_data: ptr::null_mut(),
        };
        let ok = unsafe {
            CryptProtectData(
                &input,
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null(),
                CRYPTPROTECT_UI_FORBIDDEN,
                &mut output,
            )
        };
        if ok == 0 {
            return Err(StoreError::Native(format!(
                "CryptProtectData failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(take_output(&output))
    }

    pub fn unprotect(ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        let input = input_blob(ciphertext)?;
        let mut output = DataBlob {
            cb_data: 0,
            pb_data: ptr::null_mut(),
        };
        let ok = unsafe {
            CryptUnprotectData(
                &input,
                ptr::null_mut(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null(),
                CRYPTPROTECT_UI_FORBIDDEN,
                &mut output,
            )
        };
        if ok == 0 {
            return Err(StoreError::Native(format!(
                "CryptUnprotectData failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(take_output(&output))
    }

    pub const AVAILABLE: bool = true;
}

// Elsewhere: no native service

#[cfg(not(windows))]
mod imp {
    use super::*;

    fn unavailable() -> StoreError {
        StoreError::PlatformUnavailable(format!(
            "native user encryption is only available on Windows, not {}",
            std::env::consts::OS
        ))
    }

    pub fn protect(_plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        Err(unavailable())
    }

    pub fn unprotect(_ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        Err(unavailable())
    }

    pub const AVAILABLE: bool = false;
}

impl NativeProtector for DpapiProtector {
    fn is_available(&self) -> bool {
        imp::AVAILABLE
    }

    fn protect(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        imp::protect(plaintext)
    }

    fn unprotect(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        imp::unprotect(ciphertext)
    }
}
