//! Unified error types for the garage monitor firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they can
//! be passed through the dispatcher and scheduler without allocation.
//!
//! Rate-limited and unknown commands are *not* errors; see
//! [`CommandOutcome`](crate::app::commands::CommandOutcome).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The environment sensor could not be read.
    Sensor(SensorError),
    /// The publish/subscribe link failed.
    Link(LinkError),
    /// The device has been asked to restart; nothing after this point runs
    /// on real hardware.
    Fatal(FatalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Fatal(e) => write!(f, "fatal: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I²C transaction failed or the device did not answer.
    BusFailed,
    /// The driver has not completed its init sequence.
    NotInitialised,
    /// The measurement came back without a humidity or pressure value.
    IncompleteReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "I2C bus transaction failed"),
            Self::NotInitialised => write!(f, "sensor not initialised"),
            Self::IncompleteReading => write!(f, "incomplete reading"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Session establishment was refused or the broker was unreachable.
    ConnectFailed,
    /// The broker did not acknowledge the connection in time.
    Timeout,
    /// Subscribing to the command topic failed.
    SubscribeFailed,
    /// A single publish did not go out.
    PublishFailed,
    /// No session is currently established.
    NotConnected,
    /// The session dropped after it was established.
    ConnectionLost,
    /// A topic or payload does not fit its fixed-capacity buffer.
    MessageTooLarge,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "MQTT connect failed"),
            Self::Timeout => write!(f, "MQTT connect timed out"),
            Self::SubscribeFailed => write!(f, "MQTT subscribe failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::NotConnected => write!(f, "no MQTT session"),
            Self::ConnectionLost => write!(f, "MQTT connection lost"),
            Self::MessageTooLarge => write!(f, "message exceeds buffer capacity"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration validation.  A bad config never reaches the
/// main loop (see [`crate::config::load`]), so this is not part of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Fatal conditions
// ---------------------------------------------------------------------------

/// Conditions that end in a full device restart.  By the time one of these
/// is returned the restart has already been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    /// Every link-establishment attempt failed.
    LinkExhausted,
    /// The link stayed down for too many consecutive polls after startup.
    LinkLost,
    /// A firmware update was installed and the restart was requested.
    UpdateInstalled,
    /// The network join collaborator failed at boot.
    NetworkUnavailable,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkExhausted => write!(f, "link attempts exhausted"),
            Self::LinkLost => write!(f, "link lost after startup"),
            Self::UpdateInstalled => write!(f, "firmware update installed"),
            Self::NetworkUnavailable => write!(f, "network unavailable"),
        }
    }
}

impl From<FatalError> for Error {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
