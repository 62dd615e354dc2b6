//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the door input pins, the trigger relay, the two heartbeat LEDs,
//! the environment sensor, the clock and the delay, exposing them through
//! [`SignalPort`], [`ActuatorPort`], [`SensorPort`], [`TimePort`] and
//! `DelayNs`.  Pin types are anything implementing the `embedded-hal`
//! digital traits, so the same adapter drives ESP-IDF pins and host doubles.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::events::Signal;
use crate::app::ports::{ActuatorPort, SensorPort, SensorReading, SignalPort, TimePort};
use crate::error::SensorError;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, O, S, T, D> {
    /// Indexed by [`Signal::index`].
    inputs: [I; Signal::COUNT],
    relay: O,
    alive_led: O,
    board_led: O,
    sensor: S,
    clock: T,
    delay: D,
}

impl<I, O, S, T, D> HardwareAdapter<I, O, S, T, D>
where
    I: InputPin,
    O: OutputPin,
    S: SensorPort,
    T: TimePort,
    D: DelayNs,
{
    /// `inputs` must be ordered like [`Signal::ALL`].  The relay is driven
    /// to its idle (high) level immediately.
    pub fn new(
        inputs: [I; Signal::COUNT],
        relay: O,
        alive_led: O,
        board_led: O,
        sensor: S,
        clock: T,
        delay: D,
    ) -> Self {
        let mut adapter = Self {
            inputs,
            relay,
            alive_led,
            board_led,
            sensor,
            clock,
            delay,
        };
        adapter.set_relay_active(false);
        adapter
    }
}

// ── SignalPort ────────────────────────────────────────────────

impl<I: InputPin, O, S, T, D> SignalPort for HardwareAdapter<I, O, S, T, D> {
    fn level(&mut self, signal: Signal) -> bool {
        match self.inputs[signal.index()].is_high() {
            Ok(high) => high,
            Err(_) => {
                warn!("hardware: {:?} input read failed, treating as low", signal);
                false
            }
        }
    }
}

// ── ActuatorPort ──────────────────────────────────────────────

impl<I, O: OutputPin, S, T, D> ActuatorPort for HardwareAdapter<I, O, S, T, D> {
    fn set_relay_active(&mut self, active: bool) {
        // Active-low: pulling the line low closes the door opener contact.
        let result = if active { self.relay.set_low() } else { self.relay.set_high() };
        if result.is_err() {
            warn!("hardware: relay write failed (active={})", active);
        }
    }

    fn set_heartbeat(&mut self, on: bool) {
        for led in [&mut self.alive_led, &mut self.board_led] {
            let result = if on { led.set_high() } else { led.set_low() };
            if result.is_err() {
                warn!("hardware: LED write failed (on={})", on);
            }
        }
    }
}

// ── SensorPort / TimePort / DelayNs ───────────────────────────

impl<I, O, S: SensorPort, T, D> SensorPort for HardwareAdapter<I, O, S, T, D> {
    fn read_environment(&mut self) -> Result<SensorReading, SensorError> {
        self.sensor.read_environment()
    }
}

impl<I, O, S, T: TimePort, D> TimePort for HardwareAdapter<I, O, S, T, D> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl<I, O, S, T, D: DelayNs> DelayNs for HardwareAdapter<I, O, S, T, D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
