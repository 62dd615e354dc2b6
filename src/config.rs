//! System configuration parameters
//!
//! All tunable parameters for the garage monitor.  Intervals and windows
//! are configuration, not constants: some installations publish sensor
//! telemetry every 10 s instead of every 60 s.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum length of a topic prefix or subscription topic.
pub const TOPIC_CAP: usize = 32;

/// How sensor readings are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryFormat {
    /// Three messages: `<device>/bme280/temperature|pressure|humidity`.
    Discrete,
    /// One JSON object on `<device>/bme280/data`.
    Json,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Link ---
    /// Prefix for every outbound topic (`<device>/info`, ...).
    pub device_topic: heapless::String<TOPIC_CAP>,
    /// The single inbound command subscription.
    pub command_topic: heapless::String<TOPIC_CAP>,
    /// MQTT client identifier.
    pub client_id: heapless::String<TOPIC_CAP>,
    /// MQTT keepalive (seconds)
    pub keepalive_secs: u16,
    /// Session establishment attempts before restarting.
    pub link_attempts: u8,
    /// Pause after a failed attempt (milliseconds)
    pub link_retry_delay_ms: u32,
    /// How long one attempt waits for the broker's CONNACK (milliseconds)
    pub link_connect_timeout_ms: u32,
    /// Consecutive failed polls after startup that count as a lost link.
    pub link_failure_limit: u8,

    // --- Door inputs ---
    /// Debounce for open / closed / obstructed / PIR edges (milliseconds)
    pub edge_debounce_ms: u32,
    /// Debounce for the moving relay line (milliseconds)
    pub moving_debounce_ms: u32,

    // --- Door relay ---
    /// How long the trigger relay is held active (milliseconds)
    pub relay_pulse_ms: u32,
    /// Minimum spacing between accepted relay pulses (milliseconds)
    pub min_trigger_interval_ms: u64,

    // --- Timing ---
    /// Main loop suspension between iterations (milliseconds)
    pub loop_quantum_ms: u32,
    /// Heartbeat LED blink interval (seconds)
    pub heartbeat_interval_secs: u32,
    /// Sensor telemetry interval (seconds)
    pub sensor_interval_secs: u32,
    /// Raw door level snapshot interval (seconds)
    pub door_snapshot_interval_secs: u32,
    /// Heartbeat LED on-time (milliseconds)
    pub heartbeat_blink_ms: u32,
    /// LED on-time at boot (milliseconds)
    pub boot_blink_ms: u32,
    /// Pause between the "resetting" notice and the restart (milliseconds)
    pub restart_grace_ms: u32,

    // --- Telemetry ---
    pub telemetry_format: TelemetryFormat,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Link
            device_topic: short_str("pipicow"),
            command_topic: short_str("pipicow"),
            client_id: short_str("PiPicoW"),
            keepalive_secs: 3600,
            link_attempts: 5,
            link_retry_delay_ms: 3000,
            link_connect_timeout_ms: 5000,
            link_failure_limit: 5,

            // Door inputs
            edge_debounce_ms: 100,
            moving_debounce_ms: 1000,

            // Door relay
            relay_pulse_ms: 500,
            min_trigger_interval_ms: 5000,

            // Timing
            loop_quantum_ms: 1000,
            heartbeat_interval_secs: 5,
            sensor_interval_secs: 60,
            door_snapshot_interval_secs: 60,
            heartbeat_blink_ms: 50,
            boot_blink_ms: 500,
            restart_grace_ms: 500,

            telemetry_format: TelemetryFormat::Discrete,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("device_topic is empty"));
        }
        if self.command_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("command_topic is empty"));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::ValidationFailed("client_id is empty"));
        }
        if self.link_attempts == 0 {
            return Err(ConfigError::ValidationFailed("link_attempts must be >= 1"));
        }
        if self.link_failure_limit == 0 {
            return Err(ConfigError::ValidationFailed("link_failure_limit must be >= 1"));
        }
        if self.heartbeat_interval_secs == 0
            || self.sensor_interval_secs == 0
            || self.door_snapshot_interval_secs == 0
        {
            return Err(ConfigError::ValidationFailed("job intervals must be non-zero"));
        }
        if self.loop_quantum_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_quantum_ms must be non-zero"));
        }
        if self.edge_debounce_ms == 0 || self.moving_debounce_ms == 0 {
            return Err(ConfigError::ValidationFailed("debounce windows must be non-zero"));
        }
        if self.relay_pulse_ms == 0 {
            return Err(ConfigError::ValidationFailed("relay_pulse_ms must be non-zero"));
        }
        if u64::from(self.relay_pulse_ms) > self.min_trigger_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "relay_pulse_ms exceeds min_trigger_interval_ms",
            ));
        }
        Ok(())
    }
}

/// Build-time JSON override for [`SystemConfig`].
pub const CONFIG_JSON: Option<&str> = option_env!("GARAGEMON_CONFIG_JSON");

/// Resolve the running configuration from an optional JSON override.  An
/// override that does not parse or validate falls back to the defaults.
pub fn load(json: Option<&str>) -> SystemConfig {
    let Some(json) = json else {
        return SystemConfig::default();
    };
    match serde_json::from_str::<SystemConfig>(json) {
        Ok(cfg) => match cfg.validate() {
            Ok(()) => {
                info!("config: loaded override");
                cfg
            }
            Err(e) => {
                warn!("config: override rejected ({}), using defaults", e);
                SystemConfig::default()
            }
        },
        Err(e) => {
            warn!("config: override unparsable ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// Build a fixed-capacity string from a literal, truncating at `TOPIC_CAP`.
pub fn short_str(s: &str) -> heapless::String<TOPIC_CAP> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Build-time secrets.  Set the environment variables when compiling the
/// firmware; host builds fall back to empty strings.
pub mod secrets {
    pub const WIFI_SSID: &str = match option_env!("GARAGEMON_WIFI_SSID") {
        Some(v) => v,
        None => "",
    };
    pub const WIFI_PASSWORD: &str = match option_env!("GARAGEMON_WIFI_PASSWORD") {
        Some(v) => v,
        None => "",
    };
    pub const MQTT_URL: &str = match option_env!("GARAGEMON_MQTT_URL") {
        Some(v) => v,
        None => "mqtt://localhost:1883",
    };
    pub const MQTT_USERNAME: &str = match option_env!("GARAGEMON_MQTT_USERNAME") {
        Some(v) => v,
        None => "",
    };
    pub const MQTT_PASSWORD: &str = match option_env!("GARAGEMON_MQTT_PASSWORD") {
        Some(v) => v,
        None => "",
    };
    /// Firmware image served over HTTP(S).  Empty disables self-update.
    pub const OTA_URL: &str = match option_env!("GARAGEMON_OTA_URL") {
        Some(v) => v,
        None => "",
    };
}
