//! Input signals and outbound application events.
//!
//! The [`DoorTracker`](super::door::DoorTracker) emits [`AppEvent`]s through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: queue them for the link or log them to
//! serial.

/// A physical input line that raises edge interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Signal {
    /// Limit switch at the fully-open position.
    Open = 0,
    /// Limit switch at the fully-closed position.
    Closed = 1,
    /// Motor relay line; pulses when the door starts or stops.
    Moving = 2,
    /// Obstruction beam.
    Obstructed = 3,
    /// PIR motion sensor.
    Motion = 4,
}

impl Signal {
    pub const COUNT: usize = 5;

    /// All signals, in the order pending checks are serviced.
    pub const ALL: [Signal; Signal::COUNT] = [
        Signal::Open,
        Signal::Closed,
        Signal::Moving,
        Signal::Obstructed,
        Signal::Motion,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit used for this signal in the ISR pending mask.
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// An edge-triggered notification from the door tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Opened,
    Closed,
    Moving,
    Stopped,
    Obstructed,
    Motion,
}

impl AppEvent {
    /// Payload published for this event.
    pub fn payload(self) -> &'static str {
        match self {
            Self::Opened => "open",
            Self::Closed => "closed",
            Self::Moving => "moving",
            Self::Stopped => "stopped",
            Self::Obstructed => "obstructed",
            Self::Motion => "motion",
        }
    }

    /// Topic suffix under the device prefix.
    pub fn topic_suffix(self) -> &'static str {
        match self {
            Self::Motion => "pir",
            _ => "doorState",
        }
    }
}
