//! Controller: the hexagonal core of the main loop.
//!
//! [`Controller`] owns the link manager, the command dispatcher, the
//! telemetry publisher and the job scheduler.  All I/O flows through port
//! traits passed in at call sites, so the whole loop runs against mocks.
//!
//! ```text
//!   LinkManager ──poll──▶ ┌──────────────────────┐ ──▶ relay / info
//!                         │      Controller      │
//!   DOOR_EVENTS ─drain──▶ │ dispatch · schedule  │ ──▶ doorState / pir
//!                         └──────────────────────┘
//!                                   │ tick
//!                                   ▼
//!                  heartbeat · sensor · door snapshot
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::{Error, FatalError, Result};
use crate::events::{drain_door_events, DOOR_EVENT_CAP};
use crate::scheduler::{Job, Scheduler};

use super::commands::CommandOutcome;
use super::dispatch::CommandDispatcher;
use super::events::AppEvent;
use super::link::LinkManager;
use super::ports::{Board, LinkConnector, Publisher, SchedulerDelegate, SystemPort, UpdatePort};
use super::telemetry::TelemetryPublisher;

/// Door event channel type shared with the edge service.
pub type DoorEventChannel = Channel<CriticalSectionRawMutex, AppEvent, DOOR_EVENT_CAP>;

pub struct Controller<C: LinkConnector> {
    config: SystemConfig,
    link: LinkManager<C>,
    dispatcher: CommandDispatcher,
    telemetry: TelemetryPublisher,
    scheduler: Scheduler,
}

impl<C: LinkConnector> Controller<C> {
    pub fn new(config: SystemConfig, connector: C) -> Self {
        Self {
            link: LinkManager::new(connector, &config),
            dispatcher: CommandDispatcher::new(&config),
            telemetry: TelemetryPublisher::new(&config),
            scheduler: Scheduler::new(),
            config,
        }
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Light the LEDs once so a power-on is visible.
    pub fn boot_blink(&self, hw: &mut impl Board) {
        hw.set_heartbeat(true);
        hw.delay_ms(self.config.boot_blink_ms);
        hw.set_heartbeat(false);
    }

    /// Bring the link up.  Exhaustion restarts the device.
    pub fn connect(&mut self, hw: &mut impl Board, system: &mut impl SystemPort) -> Result<()> {
        self.link.connect(hw, system)
    }

    /// Register the periodic jobs and publish the first reading and door
    /// snapshot.  Failures here are reported, never fatal.
    pub fn start(&mut self, hw: &mut impl Board) {
        let now = hw.now_ms();
        let secs = |s: u32| u64::from(s) * 1_000;
        self.scheduler
            .add("heartbeat", Job::Heartbeat, secs(self.config.heartbeat_interval_secs), now);
        self.scheduler
            .add("sensor", Job::SensorTelemetry, secs(self.config.sensor_interval_secs), now);
        self.scheduler.add(
            "door-snapshot",
            Job::DoorSnapshot,
            secs(self.config.door_snapshot_interval_secs),
            now,
        );

        if let Err(e) = self.telemetry.publish_sensor_reading(&mut self.link, hw) {
            warn!("controller: initial sensor publish failed: {}", e);
        }
        if let Err(e) = self.telemetry.publish_door_state(&mut self.link, hw) {
            warn!("controller: initial door snapshot failed: {}", e);
        }
        info!("controller: started with {} jobs", self.scheduler.len());
    }

    // ── Main loop ─────────────────────────────────────────────

    /// One loop iteration: at most one inbound command, then queued door
    /// events, then due jobs.
    ///
    /// Only fatal conditions are returned as `Err`: a lost link, or an
    /// installed update whose restart has been requested.  Everything else
    /// is contained and logged here.
    pub fn step(
        &mut self,
        hw: &mut impl Board,
        updater: &mut impl UpdatePort,
        system: &mut impl SystemPort,
        door_events: &DoorEventChannel,
    ) -> Result<Option<CommandOutcome>> {
        let mut outcome = None;
        if let Some(msg) = self.link.poll(system)? {
            outcome = Some(self.dispatcher.handle_command(
                &msg.topic,
                &msg.payload,
                &mut self.link,
                hw,
                updater,
                system,
            ));
        }
        if outcome == Some(CommandOutcome::Restarting) {
            return Err(FatalError::UpdateInstalled.into());
        }

        drain_door_events(door_events, |event| {
            if let Err(e) = self.telemetry.publish_event(&mut self.link, event) {
                warn!("controller: {:?} not published: {}", event, e);
            }
        });

        let mut jobs = JobRunner {
            hw,
            link: &mut self.link,
            telemetry: &self.telemetry,
            heartbeat_blink_ms: self.config.heartbeat_blink_ms,
        };
        self.scheduler.tick(&mut jobs);

        Ok(outcome)
    }

    /// Run the loop until a fatal condition.  `each_iteration` runs after
    /// every step (watchdog feed).
    pub fn run(
        &mut self,
        hw: &mut impl Board,
        updater: &mut impl UpdatePort,
        system: &mut impl SystemPort,
        door_events: &DoorEventChannel,
        mut each_iteration: impl FnMut(),
    ) -> Error {
        loop {
            if let Err(e) = self.step(hw, updater, system, door_events) {
                return e;
            }
            each_iteration();
            hw.delay_ms(self.config.loop_quantum_ms);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn link(&self) -> &LinkManager<C> {
        &self.link
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }
}

/// Runs scheduled jobs against the board and the link.
struct JobRunner<'a, H, P> {
    hw: &'a mut H,
    link: &'a mut P,
    telemetry: &'a TelemetryPublisher,
    heartbeat_blink_ms: u32,
}

impl<H: Board, P: Publisher> SchedulerDelegate for JobRunner<'_, H, P> {
    fn on_job_due(&mut self, job: Job) -> Result<()> {
        match job {
            Job::Heartbeat => {
                self.hw.set_heartbeat(true);
                self.hw.delay_ms(self.heartbeat_blink_ms);
                self.hw.set_heartbeat(false);
                Ok(())
            }
            Job::SensorTelemetry => self
                .telemetry
                .publish_sensor_reading(&mut *self.link, &mut *self.hw)
                .map(|_| ()),
            Job::DoorSnapshot => self
                .telemetry
                .publish_door_state(&mut *self.link, &mut *self.hw),
        }
    }

    fn now_ms(&self) -> u64 {
        self.hw.now_ms()
    }
}
