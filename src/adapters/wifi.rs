//! Wi-Fi station join.
//!
//! A blocking, one-shot join at boot.  The monitor never reconnects Wi-Fi
//! in place: if the join fails, `main` restarts the device, and a dropped
//! association later surfaces as a lost MQTT link.

use core::fmt;

#[cfg(not(target_os = "espidf"))]
use log::info;

/// Maximum SSID length (IEEE 802.11).
pub const SSID_MAX_LEN: usize = 32;
/// WPA2 passphrase bounds.
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    /// The driver refused to start, associate or bring the netif up.
    JoinFailed,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::JoinFailed => write!(f, "join failed"),
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Reject credentials the driver would refuse anyway.  An empty password
/// selects an open network.
pub fn validate_credentials(ssid: &str, password: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > SSID_MAX_LEN || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    if !password.is_empty()
        && (password.len() < PASSWORD_MIN_LEN || password.len() > PASSWORD_MAX_LEN)
    {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{validate_credentials, WifiError};

    /// The associated station.  Dropping it disconnects.
    pub struct WifiLink {
        _wifi: BlockingWifi<EspWifi<'static>>,
    }

    pub fn join(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        ssid: &str,
        password: &str,
    ) -> Result<WifiLink, WifiError> {
        validate_credentials(ssid, password)?;

        let fail = |step: &'static str| {
            move |e: esp_idf_svc::sys::EspError| {
                warn!("wifi: {} failed: {}", step, e);
                WifiError::JoinFailed
            }
        };

        let driver = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(fail("driver init"))?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(fail("wrap"))?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: password.try_into().map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        wifi.set_configuration(&config).map_err(fail("configure"))?;
        wifi.start().map_err(fail("start"))?;
        info!("wifi: joining '{}'", ssid);
        wifi.connect().map_err(fail("connect"))?;
        wifi.wait_netif_up().map_err(fail("netif up"))?;

        if let Ok(ip) = wifi.wifi().sta_netif().get_ip_info() {
            info!("wifi: up, ip={}", ip.ip);
        }
        Ok(WifiLink { _wifi: wifi })
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{join, WifiLink};

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Simulation: a joined network is just validated credentials.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct WifiLink;

#[cfg(not(target_os = "espidf"))]
pub fn join(ssid: &str, password: &str) -> Result<WifiLink, WifiError> {
    validate_credentials(ssid, password)?;
    info!("wifi(sim): joined '{}'", ssid);
    Ok(WifiLink)
}
