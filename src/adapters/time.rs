//! ESP32 time adapter.
//!
//! Monotonic milliseconds for the scheduler and the relay rate limit, plus
//! a one-shot wall-clock sync at boot.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::app::ports::TimePort;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl TimePort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a monotonic counter read.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Keeps the SNTP client alive; dropping it stops synchronisation.
#[cfg(target_os = "espidf")]
pub struct WallClock {
    _sntp: esp_idf_svc::sntp::EspSntp<'static>,
}

/// Start SNTP against the default pool.  Runs in the background; nothing in
/// the control loop depends on wall-clock time, so failure is not fatal.
#[cfg(target_os = "espidf")]
pub fn sync_wall_clock() -> Option<WallClock> {
    match esp_idf_svc::sntp::EspSntp::new_default() {
        Ok(sntp) => {
            log::info!("time: SNTP started");
            Some(WallClock { _sntp: sntp })
        }
        Err(e) => {
            log::warn!("time: SNTP start failed: {}", e);
            None
        }
    }
}
