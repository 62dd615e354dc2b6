//! Remote command dispatcher.
//!
//! Handles one inbound command at a time, to completion.  The relay pulse is
//! the only physical action and is guarded by a minimum-interval rule; the
//! timestamp of the last accepted pulse lives here and is only reset by a
//! reboot.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::SystemConfig;

use super::commands::{Command, CommandOutcome};
use super::ports::{ActuatorPort, Publisher, SensorPort, SystemPort, TimePort, UpdatePort};
use super::telemetry::TelemetryPublisher;

pub const INFO_UPDATE_RECEIVED: &str = "update command received";
pub const INFO_UPDATE_INSTALLED: &str = "code updated, resetting machine";
pub const INFO_NO_UPDATE: &str = "no update available";
pub const INFO_RELAY_PULSE: &str = "door relay pulse";
pub const INFO_TOO_EARLY: &str = "door command rejected: too early";
pub const INFO_BME_OK: &str = "BME request succeeded";
pub const INFO_BME_FAILED: &str = "BME request failed";
pub const INFO_UNKNOWN: &str = "unknown mqtt command";

pub struct CommandDispatcher {
    telemetry: TelemetryPublisher,
    relay_pulse_ms: u32,
    min_trigger_interval_ms: u64,
    restart_grace_ms: u32,
    /// Completion time of the last accepted relay pulse.
    last_trigger_ms: Option<u64>,
}

impl CommandDispatcher {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            telemetry: TelemetryPublisher::new(config),
            relay_pulse_ms: config.relay_pulse_ms,
            min_trigger_interval_ms: config.min_trigger_interval_ms,
            restart_grace_ms: config.restart_grace_ms,
            last_trigger_ms: None,
        }
    }

    pub fn last_trigger_ms(&self) -> Option<u64> {
        self.last_trigger_ms
    }

    /// Parse and execute one inbound command.
    pub fn handle_command(
        &mut self,
        topic: &str,
        payload: &[u8],
        link: &mut impl Publisher,
        hw: &mut (impl SensorPort + ActuatorPort + TimePort + DelayNs),
        updater: &mut impl UpdatePort,
        system: &mut impl SystemPort,
    ) -> CommandOutcome {
        let cmd = Command::parse(payload);
        info!("dispatch: {:?} on '{}'", cmd, topic);

        let outcome = match cmd {
            Command::Update => self.update(link, hw, updater, system),
            Command::DoorPulse => self.pulse_relay(link, hw),
            Command::SensorRequest => match self.telemetry.publish_sensor_reading(link, hw) {
                Ok(_) => {
                    self.info(link, INFO_BME_OK);
                    CommandOutcome::SensorPublished
                }
                Err(e) => {
                    warn!("dispatch: sensor request failed: {}", e);
                    self.info(link, INFO_BME_FAILED);
                    CommandOutcome::SensorFailed
                }
            },
            Command::Unknown => {
                self.info(link, INFO_UNKNOWN);
                CommandOutcome::Unknown
            }
        };
        info!("dispatch: outcome {:?}", outcome);
        outcome
    }

    fn update(
        &mut self,
        link: &mut impl Publisher,
        delay: &mut impl DelayNs,
        updater: &mut impl UpdatePort,
        system: &mut impl SystemPort,
    ) -> CommandOutcome {
        self.info(link, INFO_UPDATE_RECEIVED);
        if !updater.check_and_install() {
            self.info(link, INFO_NO_UPDATE);
            return CommandOutcome::UpdateUnavailable;
        }
        self.info(link, INFO_UPDATE_INSTALLED);
        delay.delay_ms(self.restart_grace_ms);
        system.restart();
        CommandOutcome::Restarting
    }

    fn pulse_relay(
        &mut self,
        link: &mut impl Publisher,
        hw: &mut (impl ActuatorPort + TimePort + DelayNs),
    ) -> CommandOutcome {
        let now = hw.now_ms();
        if let Some(last) = self.last_trigger_ms {
            let elapsed = now.saturating_sub(last);
            if elapsed < self.min_trigger_interval_ms {
                warn!("dispatch: relay pulse {} ms after the last one", elapsed);
                self.info(link, INFO_TOO_EARLY);
                return CommandOutcome::RateLimited;
            }
        }

        hw.set_relay_active(true);
        self.info(link, INFO_RELAY_PULSE);
        hw.delay_ms(self.relay_pulse_ms);
        hw.set_relay_active(false);

        self.last_trigger_ms = Some(hw.now_ms());
        CommandOutcome::Pulsed
    }

    fn info(&self, link: &mut impl Publisher, text: &str) {
        if let Err(e) = self.telemetry.info(link, text) {
            warn!("dispatch: info '{}' not sent: {}", text, e);
        }
    }
}
