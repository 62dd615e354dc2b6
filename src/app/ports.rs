//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (pins, sensor, link, restart) implement these traits.
//! The [`Controller`](super::service::Controller) consumes them via generics,
//! so the domain core never touches hardware directly.  Delays go through
//! `embedded_hal::delay::DelayNs`, which every board adapter implements.

use embedded_hal::delay::DelayNs;

use crate::error::{LinkError, SensorError};

use super::events::{AppEvent, Signal};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One fresh environment measurement.  Never cached.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Hectopascal.
    pub pressure: f32,
    /// Percent relative humidity.
    pub humidity: f32,
}

/// Read-side port for the temperature/pressure/humidity sensor.
pub trait SensorPort {
    fn read_environment(&mut self) -> Result<SensorReading, SensorError>;
}

/// Raw level of the door input lines.
pub trait SignalPort {
    /// `true` when the line is high.
    fn level(&mut self, signal: Signal) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive outputs.
pub trait ActuatorPort {
    /// Drive the door trigger relay.  `true` = active (line low).
    fn set_relay_active(&mut self, active: bool);

    /// Switch the heartbeat LEDs.
    fn set_heartbeat(&mut self, on: bool);
}

/// Monotonic time source.
pub trait TimePort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

/// Everything the main loop needs from the board, as one bound.
pub trait Board: SensorPort + SignalPort + ActuatorPort + TimePort + DelayNs {}

impl<T: SensorPort + SignalPort + ActuatorPort + TimePort + DelayNs> Board for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → link / logging)
// ───────────────────────────────────────────────────────────────

/// The door tracker emits [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Link ports (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Maximum inbound topic length.
pub const INBOUND_TOPIC_CAP: usize = 64;
/// Maximum inbound payload length.
pub const INBOUND_PAYLOAD_CAP: usize = 256;

/// A message received on the command subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<INBOUND_TOPIC_CAP>,
    pub payload: heapless::Vec<u8, INBOUND_PAYLOAD_CAP>,
}

impl InboundMessage {
    pub fn new(topic: &str, payload: &[u8]) -> Result<Self, LinkError> {
        let mut t = heapless::String::new();
        t.push_str(topic).map_err(|_| LinkError::MessageTooLarge)?;
        let p = heapless::Vec::from_slice(payload).map_err(|_| LinkError::MessageTooLarge)?;
        Ok(Self { topic: t, payload: p })
    }
}

/// Anything that can put a message on the wire.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), LinkError>;
}

/// One established publish/subscribe session.  Dropped wholesale when the
/// link is replaced; never repaired in place.
pub trait LinkSession: Publisher {
    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError>;

    /// Return at most one pending inbound message without blocking beyond
    /// a bounded local timeout.
    fn try_recv(&mut self) -> Result<Option<InboundMessage>, LinkError>;
}

/// Opens sessions against the broker.
pub trait LinkConnector {
    type Session: LinkSession;

    fn open(&mut self) -> Result<Self::Session, LinkError>;
}

// ───────────────────────────────────────────────────────────────
// System collaborators
// ───────────────────────────────────────────────────────────────

/// Firmware self-update.
pub trait UpdatePort {
    /// Download and install a newer image if one exists.  `true` means the
    /// new image is installed and the caller should restart.
    ///
    /// The device does no version comparison.  The update server decides:
    /// it answers 200 with an image only when that image differs from the
    /// running one, and 204, 304 or 404 otherwise.  A server that always
    /// serves its image makes every update command reflash and restart.
    fn check_and_install(&mut self) -> bool;
}

/// Whole-device control.
pub trait SystemPort {
    /// Fire-and-forget full restart.  Does not return on real hardware.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the jobs it runs)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a job is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) knows nothing about LEDs,
/// sensors or the link; the controller implements this and decides what
/// each job does.
pub trait SchedulerDelegate {
    /// Run `job` to completion.  Errors are reported to the scheduler,
    /// which logs them and moves on.
    fn on_job_due(&mut self, job: crate::scheduler::Job) -> crate::error::Result<()>;

    /// Current time, used to stamp job runs.
    fn now_ms(&self) -> u64;
}
