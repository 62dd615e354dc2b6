//! Inbound remote commands.
//!
//! The vocabulary is fixed and matched by substring, first match wins:
//! `OTA` before `door` before `BME`.  Anything else is an unknown command,
//! which is an outcome rather than an error.

/// A parsed command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Check for and install a firmware update.
    Update,
    /// Pulse the door trigger relay (rate-limited).
    DoorPulse,
    /// Publish a fresh sensor reading.
    SensorRequest,
    /// Not in the vocabulary, or not UTF-8.
    Unknown,
}

impl Command {
    /// Keywords in precedence order.
    const VOCABULARY: [(&'static str, Command); 3] = [
        ("OTA", Command::Update),
        ("door", Command::DoorPulse),
        ("BME", Command::SensorRequest),
    ];

    pub fn parse(payload: &[u8]) -> Self {
        let Ok(text) = core::str::from_utf8(payload) else {
            return Command::Unknown;
        };
        Self::VOCABULARY
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map_or(Command::Unknown, |(_, cmd)| *cmd)
    }
}

/// What the dispatcher did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Update installed; restart requested.
    Restarting,
    /// Update collaborator found nothing newer.
    UpdateUnavailable,
    /// Relay pulse executed.
    Pulsed,
    /// Relay pulse rejected by the minimum-interval rule.
    RateLimited,
    SensorPublished,
    SensorFailed,
    Unknown,
}
