//! Link manager: owns the one publish/subscribe session.
//!
//! ```text
//! connect():  attempt 1 ─fail─▶ wait ─▶ attempt 2 ─▶ … ─▶ attempt N ─fail─▶ restart
//!                 │ ok
//!                 ▼
//!             subscribe(command topic)
//!
//! poll():     ok ─▶ reset failure count
//!             err ─▶ count += 1 ─▶ count == limit ─▶ restart
//! ```
//!
//! A session is never repaired in place.  Once the device is up, a link that
//! keeps failing ends in a restart, which rebuilds everything from scratch.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::config::{SystemConfig, TOPIC_CAP};
use crate::error::{Error, FatalError, LinkError, Result};

use super::ports::{InboundMessage, LinkConnector, LinkSession, Publisher, SystemPort};

pub struct LinkManager<C: LinkConnector> {
    connector: C,
    session: Option<C::Session>,
    command_topic: heapless::String<TOPIC_CAP>,
    attempts: u8,
    retry_delay_ms: u32,
    failure_limit: u8,
    consecutive_failures: u8,
}

impl<C: LinkConnector> LinkManager<C> {
    pub fn new(connector: C, config: &SystemConfig) -> Self {
        Self {
            connector,
            session: None,
            command_topic: config.command_topic.clone(),
            attempts: config.link_attempts,
            retry_delay_ms: config.link_retry_delay_ms,
            failure_limit: config.link_failure_limit,
            consecutive_failures: 0,
        }
    }

    /// Establish the session and subscribe to the command topic.
    ///
    /// After the last failed attempt the device is restarted and
    /// `Error::Fatal(LinkExhausted)` is returned; no further attempt is made.
    pub fn connect(&mut self, delay: &mut impl DelayNs, system: &mut impl SystemPort) -> Result<()> {
        self.session = None;
        for attempt in 1..=self.attempts {
            info!("link: connect attempt {}/{}", attempt, self.attempts);
            match self.open_and_subscribe() {
                Ok(session) => {
                    info!("link: connected, subscribed to '{}'", self.command_topic);
                    self.session = Some(session);
                    self.consecutive_failures = 0;
                    return Ok(());
                }
                Err(e) => {
                    warn!("link: attempt {} failed: {}", attempt, e);
                    if attempt < self.attempts {
                        delay.delay_ms(self.retry_delay_ms);
                    }
                }
            }
        }
        error!("link: {} attempts exhausted, restarting", self.attempts);
        system.restart();
        Err(FatalError::LinkExhausted.into())
    }

    fn open_and_subscribe(&mut self) -> core::result::Result<C::Session, LinkError> {
        let mut session = self.connector.open()?;
        session.subscribe(&self.command_topic)?;
        Ok(session)
    }

    /// Fetch at most one pending inbound message.
    ///
    /// A failed poll counts toward the sustained-failure limit; reaching it
    /// restarts the device and returns `Error::Fatal(LinkLost)`.
    pub fn poll(&mut self, system: &mut impl SystemPort) -> Result<Option<InboundMessage>> {
        let result = match self.session.as_mut() {
            Some(session) => session.try_recv(),
            None => Err(LinkError::NotConnected),
        };
        match result {
            Ok(msg) => {
                self.consecutive_failures = 0;
                Ok(msg)
            }
            Err(e) => self.record_failure(e, system),
        }
    }

    fn record_failure(
        &mut self,
        e: LinkError,
        system: &mut impl SystemPort,
    ) -> Result<Option<InboundMessage>> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        warn!(
            "link: poll failed ({}/{}): {}",
            self.consecutive_failures, self.failure_limit, e
        );
        if self.consecutive_failures < self.failure_limit {
            return Ok(None);
        }
        error!("link: lost after startup, restarting");
        self.session = None;
        system.restart();
        Err(Error::Fatal(FatalError::LinkLost))
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.consecutive_failures
    }
}

impl<C: LinkConnector> Publisher for LinkManager<C> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> core::result::Result<(), LinkError> {
        match self.session.as_mut() {
            Some(session) => session.publish(topic, payload),
            None => Err(LinkError::NotConnected),
        }
    }
}
