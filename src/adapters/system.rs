//! Whole-device collaborators: restart, firmware self-update and the
//! boot-time rollback check.
//!
//! The updater pulls one image from a fixed URL.  Any failure along the way
//! (no URL, HTTP error, flash write) means "no update available"; the
//! running image is never touched until the new one has been written and
//! verified by `esp-ota`.

use core::fmt;

/// Largest image that fits the OTA partition.
pub const MAX_FIRMWARE_SIZE: u64 = 0x1E_0000;
/// HTTP read / flash write chunk.
pub const OTA_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    /// No image configured, or the server said there is nothing new.
    NoUpdate,
    HttpStatus(u16),
    InvalidSize,
    Download,
    Flash,
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUpdate => write!(f, "no update available"),
            Self::HttpStatus(code) => write!(f, "HTTP status {}", code),
            Self::InvalidSize => write!(f, "image size out of range"),
            Self::Download => write!(f, "download failed"),
            Self::Flash => write!(f, "flash write failed"),
        }
    }
}

/// Decide from the response head whether an image follows.  Returns the
/// expected length when it is known.
///
/// Any 200 with a body is taken as a new image; the server owns the
/// version decision (see [`UpdatePort`](crate::app::ports::UpdatePort)).
pub fn check_response(status: u16, content_length: Option<u64>) -> Result<Option<u64>, OtaError> {
    match status {
        200 => {}
        204 | 304 | 404 => return Err(OtaError::NoUpdate),
        other => return Err(OtaError::HttpStatus(other)),
    }
    match content_length {
        Some(0) => Err(OtaError::NoUpdate),
        Some(len) if len > MAX_FIRMWARE_SIZE => Err(OtaError::InvalidSize),
        len => Ok(len),
    }
}

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use esp_idf_svc::http::Method;
    use log::{info, warn};

    use super::{check_response, OtaError, MAX_FIRMWARE_SIZE, OTA_CHUNK_SIZE};
    use crate::app::ports::{SystemPort, UpdatePort};

    /// Restarts through ESP-IDF.
    pub struct EspSystem;

    impl SystemPort for EspSystem {
        fn restart(&mut self) {
            warn!("system: restarting");
            esp_idf_svc::hal::reset::restart();
        }
    }

    pub struct OtaUpdater {
        url: &'static str,
    }

    impl OtaUpdater {
        pub fn new(url: &'static str) -> Self {
            Self { url }
        }

        fn install(&self) -> Result<u64, OtaError> {
            if self.url.is_empty() {
                return Err(OtaError::NoUpdate);
            }
            let conf = Configuration {
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let mut conn = EspHttpConnection::new(&conf).map_err(|e| {
                warn!("ota: http client init failed: {}", e);
                OtaError::Download
            })?;
            conn.initiate_request(Method::Get, self.url, &[])
                .and_then(|()| conn.initiate_response())
                .map_err(|e| {
                    warn!("ota: request failed: {}", e);
                    OtaError::Download
                })?;
            let content_length = conn.header("Content-Length").and_then(|v| v.parse().ok());
            let expected = check_response(conn.status(), content_length)?;

            let mut update = esp_ota::OtaUpdate::begin().map_err(|e| {
                warn!("ota: begin failed: {:?}", e);
                OtaError::Flash
            })?;
            let mut chunk = [0u8; OTA_CHUNK_SIZE];
            let mut written = 0u64;
            loop {
                let n = conn.read(&mut chunk).map_err(|e| {
                    warn!("ota: read failed after {} bytes: {}", written, e);
                    OtaError::Download
                })?;
                if n == 0 {
                    break;
                }
                written += n as u64;
                if written > MAX_FIRMWARE_SIZE {
                    return Err(OtaError::InvalidSize);
                }
                update.write(&chunk[..n]).map_err(|e| {
                    warn!("ota: write failed: {:?}", e);
                    OtaError::Flash
                })?;
                // SAFETY: resets the calling task's TWDT entry; a no-op
                // when the task is not subscribed.
                unsafe {
                    esp_idf_svc::sys::esp_task_wdt_reset();
                }
            }
            if expected.is_some_and(|len| len != written) {
                warn!("ota: short image ({} of {:?} bytes)", written, expected);
                return Err(OtaError::Download);
            }

            let mut completed = update.finalize().map_err(|e| {
                warn!("ota: image verification failed: {:?}", e);
                OtaError::Flash
            })?;
            completed.set_as_boot_partition().map_err(|e| {
                warn!("ota: set boot partition failed: {:?}", e);
                OtaError::Flash
            })?;
            Ok(written)
        }
    }

    impl UpdatePort for OtaUpdater {
        fn check_and_install(&mut self) -> bool {
            match self.install() {
                Ok(bytes) => {
                    info!("ota: installed {} bytes", bytes);
                    true
                }
                Err(OtaError::NoUpdate) => {
                    info!("ota: no update available");
                    false
                }
                Err(e) => {
                    warn!("ota: update abandoned: {}", e);
                    false
                }
            }
        }
    }

    /// Mark the running image valid so the bootloader does not roll back.
    pub fn check_rollback() {
        match esp_ota::mark_app_valid() {
            Ok(()) => info!("ota: firmware marked valid"),
            Err(e) => warn!("ota: mark_app_valid failed: {:?}", e),
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{check_rollback, EspSystem, OtaUpdater};
