//! Mock adapters for integration tests.
//!
//! `MockBoard` records every relay, LED and delay call against a manual
//! clock that only moves when something delays.  The link mocks share one
//! `LinkLog` so a test can hand the connector to the controller and still
//! inspect what went over the wire.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use garagemon::app::events::Signal;
use garagemon::app::ports::{
    ActuatorPort, InboundMessage, LinkConnector, LinkSession, Publisher, SensorPort,
    SensorReading, SignalPort, SystemPort, TimePort, UpdatePort,
};
use garagemon::error::{LinkError, SensorError};

// ── Board ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Relay(bool),
    Heartbeat(bool),
    Delay(u32),
}

pub const READING: SensorReading = SensorReading {
    temperature: 21.5,
    pressure: 1013.25,
    humidity: 45.0,
};

pub struct MockBoard {
    pub levels: [bool; Signal::COUNT],
    /// `(clock at call time, call)`.
    pub calls: Vec<(u64, HwCall)>,
    pub sensor_fails: bool,
    pub sensor_reads: u32,
    now: Cell<u64>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            levels: [false; Signal::COUNT],
            calls: Vec::new(),
            sensor_fails: false,
            sensor_reads: 0,
            now: Cell::new(0),
        }
    }

    pub fn at(now_ms: u64) -> Self {
        let board = Self::new();
        board.now.set(now_ms);
        board
    }

    pub fn set_now(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn set_level(&mut self, signal: Signal, high: bool) {
        self.levels[signal.index()] = high;
    }

    pub fn relay_calls(&self) -> Vec<(u64, bool)> {
        self.calls
            .iter()
            .filter_map(|(t, c)| match c {
                HwCall::Relay(active) => Some((*t, *active)),
                _ => None,
            })
            .collect()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|(_, c)| match c {
                HwCall::Delay(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    pub fn heartbeat_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|(_, c)| matches!(c, HwCall::Heartbeat(true)))
            .count()
    }

    fn record(&mut self, call: HwCall) {
        self.calls.push((self.now.get(), call));
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalPort for MockBoard {
    fn level(&mut self, signal: Signal) -> bool {
        self.levels[signal.index()]
    }
}

impl ActuatorPort for MockBoard {
    fn set_relay_active(&mut self, active: bool) {
        self.record(HwCall::Relay(active));
    }

    fn set_heartbeat(&mut self, on: bool) {
        self.record(HwCall::Heartbeat(on));
    }
}

impl SensorPort for MockBoard {
    fn read_environment(&mut self) -> Result<SensorReading, SensorError> {
        self.sensor_reads += 1;
        if self.sensor_fails {
            Err(SensorError::BusFailed)
        } else {
            Ok(READING)
        }
    }
}

impl TimePort for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.now.set(self.now.get() + u64::from(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(HwCall::Delay(ms));
        self.now.set(self.now.get() + u64::from(ms));
    }
}

// ── Link ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LinkLog {
    pub published: Vec<(String, String)>,
    pub subscriptions: Vec<String>,
    pub open_attempts: u32,
    pub inbound: VecDeque<InboundMessage>,
    /// Upcoming `try_recv` calls that fail.
    pub poll_errors: u32,
    pub fail_publish: bool,
}

impl LinkLog {
    pub fn on(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }

    pub fn infos(&self) -> Vec<&str> {
        self.on("pipicow/info")
    }

    pub fn push_command(&mut self, payload: &str) {
        self.inbound
            .push_back(InboundMessage::new("pipicow", payload.as_bytes()).unwrap());
    }
}

pub type SharedLink = Rc<RefCell<LinkLog>>;

/// Opens sessions after `fail_first` refused attempts.
pub struct ScriptedConnector {
    log: SharedLink,
    fail_first: u32,
}

impl ScriptedConnector {
    pub fn new(fail_first: u32) -> (Self, SharedLink) {
        let log = SharedLink::default();
        (Self { log: Rc::clone(&log), fail_first }, log)
    }
}

impl LinkConnector for ScriptedConnector {
    type Session = RecordingSession;

    fn open(&mut self) -> Result<RecordingSession, LinkError> {
        let mut log = self.log.borrow_mut();
        log.open_attempts += 1;
        if log.open_attempts <= self.fail_first {
            return Err(LinkError::ConnectFailed);
        }
        Ok(RecordingSession::new(Rc::clone(&self.log)))
    }
}

pub struct RecordingSession {
    log: SharedLink,
}

impl RecordingSession {
    pub fn new(log: SharedLink) -> Self {
        Self { log }
    }
}

impl Publisher for RecordingSession {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), LinkError> {
        let mut log = self.log.borrow_mut();
        if log.fail_publish {
            return Err(LinkError::PublishFailed);
        }
        log.published
            .push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }
}

impl LinkSession for RecordingSession {
    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        self.log.borrow_mut().subscriptions.push(topic.to_string());
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<InboundMessage>, LinkError> {
        let mut log = self.log.borrow_mut();
        if log.poll_errors > 0 {
            log.poll_errors -= 1;
            return Err(LinkError::ConnectionLost);
        }
        Ok(log.inbound.pop_front())
    }
}

// ── System collaborators ──────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSystem {
    pub restarts: u32,
}

impl SystemPort for RecordingSystem {
    fn restart(&mut self) {
        self.restarts += 1;
    }
}

#[derive(Debug, Default)]
pub struct FakeUpdater {
    pub installs: bool,
    pub checks: u32,
}

impl FakeUpdater {
    pub fn installing() -> Self {
        Self { installs: true, checks: 0 }
    }
}

impl UpdatePort for FakeUpdater {
    fn check_and_install(&mut self) -> bool {
        self.checks += 1;
        self.installs
    }
}
