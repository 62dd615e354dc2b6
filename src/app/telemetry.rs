//! Outbound telemetry.
//!
//! Formats sensor readings, raw door snapshots, door events and info
//! strings onto the `<device>/...` topic tree.  No retries: a failed publish
//! is reported upward and simply not repeated until the next tick.

use core::fmt::Write;

use log::{debug, warn};

use crate::config::{SystemConfig, TelemetryFormat, TOPIC_CAP};
use crate::error::{Error, LinkError};

use super::events::{AppEvent, Signal};
use super::ports::{Publisher, SensorPort, SensorReading, SignalPort};

/// Longest topic we build: the device prefix plus the longest suffix.
pub const TOPIC_BUF: usize = 64;

/// Snapshot topics, in publish order.
const SNAPSHOT: [(Signal, &str); 4] = [
    (Signal::Open, "doorStateOpen"),
    (Signal::Closed, "doorStateClosed"),
    (Signal::Moving, "doorStateMoving"),
    (Signal::Obstructed, "doorStateObstructed"),
];

/// Join `<device>/<suffix>`.
pub fn topic(device: &str, suffix: &str) -> Result<heapless::String<TOPIC_BUF>, LinkError> {
    let mut t = heapless::String::new();
    write!(t, "{device}/{suffix}").map_err(|_| LinkError::MessageTooLarge)?;
    Ok(t)
}

pub struct TelemetryPublisher {
    device: heapless::String<TOPIC_CAP>,
    format: TelemetryFormat,
}

impl TelemetryPublisher {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            device: config.device_topic.clone(),
            format: config.telemetry_format,
        }
    }

    /// Publish a status string on `<device>/info`.
    pub fn info(&self, link: &mut impl Publisher, text: &str) -> Result<(), LinkError> {
        let t = topic(&self.device, "info")?;
        link.publish(&t, text.as_bytes())
    }

    /// Take one fresh reading and publish it in the configured format.
    pub fn publish_sensor_reading(
        &self,
        link: &mut impl Publisher,
        sensor: &mut impl SensorPort,
    ) -> Result<SensorReading, Error> {
        let reading = sensor.read_environment()?;
        debug!(
            "telemetry: T={:.2} P={:.2} H={:.2}",
            reading.temperature, reading.pressure, reading.humidity
        );
        match self.format {
            TelemetryFormat::Discrete => {
                for (suffix, value) in [
                    ("bme280/temperature", reading.temperature),
                    ("bme280/pressure", reading.pressure),
                    ("bme280/humidity", reading.humidity),
                ] {
                    let mut text: heapless::String<16> = heapless::String::new();
                    write!(text, "{value:.2}").map_err(|_| LinkError::MessageTooLarge)?;
                    link.publish(&topic(&self.device, suffix)?, text.as_bytes())?;
                }
            }
            TelemetryFormat::Json => {
                let body =
                    serde_json::to_vec(&reading).map_err(|_| LinkError::PublishFailed)?;
                link.publish(&topic(&self.device, "bme280/data")?, &body)?;
            }
        }
        Ok(reading)
    }

    /// Publish the four raw door levels as `"0"`/`"1"`.  Every topic is
    /// attempted even if an earlier one fails; the first failure is returned.
    pub fn publish_door_state(
        &self,
        link: &mut impl Publisher,
        pins: &mut impl SignalPort,
    ) -> Result<(), Error> {
        let mut first_err = None;
        for (signal, suffix) in SNAPSHOT {
            let level: &[u8] = if pins.level(signal) { b"1" } else { b"0" };
            let result = topic(&self.device, suffix).and_then(|t| link.publish(&t, level));
            if let Err(e) = result {
                warn!("telemetry: {} snapshot failed: {}", suffix, e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Publish one edge-triggered door or motion event.
    pub fn publish_event(&self, link: &mut impl Publisher, event: AppEvent) -> Result<(), LinkError> {
        let t = topic(&self.device, event.topic_suffix())?;
        link.publish(&t, event.payload().as_bytes())
    }
}
