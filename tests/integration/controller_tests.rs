//! Controller main loop: command intake, door event publication and the
//! periodic jobs, all on a manual clock.

use garagemon::app::commands::CommandOutcome;
use garagemon::app::debounce::EdgeService;
use garagemon::app::door::DoorTracker;
use garagemon::app::events::{AppEvent, Signal};
use garagemon::app::ports::EventSink;
use garagemon::app::service::{Controller, DoorEventChannel};
use garagemon::config::SystemConfig;
use garagemon::error::{Error, FatalError};
use garagemon::events::ChannelSink;

use crate::mock_hw::{
    FakeUpdater, HwCall, MockBoard, RecordingSystem, ScriptedConnector, SharedLink,
};

struct Rig {
    controller: Controller<ScriptedConnector>,
    board: MockBoard,
    log: SharedLink,
    updater: FakeUpdater,
    system: RecordingSystem,
    events: DoorEventChannel,
}

impl Rig {
    /// Connected and started at t = 0, with the start-up publishes cleared.
    fn started() -> Self {
        let (connector, log) = ScriptedConnector::new(0);
        let mut rig = Self {
            controller: Controller::new(SystemConfig::default(), connector),
            board: MockBoard::new(),
            log,
            updater: FakeUpdater::default(),
            system: RecordingSystem::default(),
            events: DoorEventChannel::new(),
        };
        rig.controller.connect(&mut rig.board, &mut rig.system).unwrap();
        rig.controller.start(&mut rig.board);
        rig.log.borrow_mut().published.clear();
        rig.board.calls.clear();
        rig
    }

    fn step_at(&mut self, now_ms: u64) -> Option<CommandOutcome> {
        self.board.set_now(now_ms);
        self.controller
            .step(&mut self.board, &mut self.updater, &mut self.system, &self.events)
            .unwrap()
    }

    fn count(&self, topic: &str) -> usize {
        self.log.borrow().on(topic).len()
    }
}

#[test]
fn boot_blink_lights_leds_once() {
    let (connector, _log) = ScriptedConnector::new(0);
    let controller = Controller::new(SystemConfig::default(), connector);
    let mut board = MockBoard::new();

    controller.boot_blink(&mut board);

    let calls: Vec<HwCall> = board.calls.iter().map(|(_, c)| *c).collect();
    assert_eq!(
        calls,
        vec![HwCall::Heartbeat(true), HwCall::Delay(500), HwCall::Heartbeat(false)]
    );
}

#[test]
fn start_publishes_initial_reading_and_snapshot() {
    let (connector, log) = ScriptedConnector::new(0);
    let mut controller = Controller::new(SystemConfig::default(), connector);
    let mut board = MockBoard::new();
    let mut system = RecordingSystem::default();
    board.set_level(Signal::Closed, true);

    controller.connect(&mut board, &mut system).unwrap();
    controller.start(&mut board);

    let log = log.borrow();
    assert_eq!(log.on("pipicow/bme280/temperature"), vec!["21.50"]);
    assert_eq!(log.on("pipicow/doorStateOpen"), vec!["0"]);
    assert_eq!(log.on("pipicow/doorStateClosed"), vec!["1"]);
    assert_eq!(log.on("pipicow/doorStateMoving"), vec!["0"]);
    assert_eq!(log.on("pipicow/doorStateObstructed"), vec!["0"]);
}

#[test]
fn one_command_per_iteration() {
    let mut rig = Rig::started();
    rig.log.borrow_mut().push_command("trigger door now");
    rig.log.borrow_mut().push_command("BME read");

    assert_eq!(rig.step_at(1_000), Some(CommandOutcome::Pulsed));
    assert_eq!(rig.step_at(2_000), Some(CommandOutcome::SensorPublished));
    assert_eq!(rig.step_at(3_000), None);
    assert_eq!(rig.controller.dispatcher().last_trigger_ms(), Some(1_500));
}

#[test]
fn queued_door_events_are_published_in_order() {
    let mut rig = Rig::started();
    {
        let mut sink = ChannelSink::new(&rig.events);
        sink.emit(AppEvent::Moving);
        sink.emit(AppEvent::Motion);
        sink.emit(AppEvent::Opened);
    }

    rig.step_at(1_000);

    let log = rig.log.borrow();
    assert_eq!(log.on("pipicow/doorState"), vec!["moving", "open"]);
    assert_eq!(log.on("pipicow/pir"), vec!["motion"]);
    assert!(rig.events.try_receive().is_err(), "channel drained");
}

#[test]
fn debounced_edge_reaches_the_broker() {
    let mut rig = Rig::started();
    let mut tracker = DoorTracker::new();
    tracker.seed(true, false);
    let mut service = EdgeService::new(rig.controller.config(), tracker);
    rig.board.set_level(Signal::Closed, true);

    // Contact bounce inside one window yields one event.
    service.on_edges(Signal::Closed.mask(), 10_000);
    service.on_edges(Signal::Closed.mask(), 10_020);
    {
        let mut sink = ChannelSink::new(&rig.events);
        service.service(10_050, &mut rig.board, &mut sink);
        service.service(10_100, &mut rig.board, &mut sink);
    }

    rig.step_at(10_200);
    assert_eq!(rig.log.borrow().on("pipicow/doorState"), vec!["closed"]);
    assert!(service.tracker().is_closed());
}

#[test]
fn heartbeat_blinks_every_five_seconds() {
    let mut rig = Rig::started();
    rig.step_at(4_999);
    assert_eq!(rig.board.heartbeat_calls(), 0);

    rig.step_at(5_000);
    let calls: Vec<HwCall> = rig.board.calls.iter().map(|(_, c)| *c).collect();
    assert_eq!(
        calls,
        vec![HwCall::Heartbeat(true), HwCall::Delay(50), HwCall::Heartbeat(false)]
    );
}

#[test]
fn sensor_and_snapshot_run_once_per_minute() {
    let mut rig = Rig::started();

    // The heartbeat at 59.9 s holds the clock for 50 ms; still short of 60 s.
    rig.step_at(59_900);
    assert_eq!(rig.count("pipicow/bme280/temperature"), 0);
    assert_eq!(rig.count("pipicow/doorStateOpen"), 0);

    rig.step_at(60_000);
    assert_eq!(rig.count("pipicow/bme280/temperature"), 1);
    assert_eq!(rig.count("pipicow/doorStateOpen"), 1);

    // Heartbeat is due again at 65 s; the minute jobs are not.
    let beats = rig.board.heartbeat_calls();
    rig.step_at(65_100);
    assert_eq!(rig.board.heartbeat_calls(), beats + 1);
    assert_eq!(rig.count("pipicow/bme280/temperature"), 1);
    assert_eq!(rig.count("pipicow/doorStateOpen"), 1);
}

#[test]
fn failed_sensor_job_is_contained() {
    let mut rig = Rig::started();
    rig.board.sensor_fails = true;

    rig.step_at(60_000);
    assert_eq!(rig.count("pipicow/bme280/temperature"), 0);
    assert_eq!(rig.count("pipicow/doorStateOpen"), 1, "later jobs still run");

    // Not retried before the next interval.
    rig.board.sensor_fails = false;
    rig.step_at(61_000);
    assert_eq!(rig.count("pipicow/bme280/temperature"), 0);
}

#[test]
fn publish_failures_never_end_the_loop() {
    let mut rig = Rig::started();
    rig.log.borrow_mut().fail_publish = true;
    rig.log.borrow_mut().push_command("BME read");
    rig.events.try_send(AppEvent::Opened).unwrap();

    assert_eq!(rig.step_at(60_000), Some(CommandOutcome::SensorFailed));
    assert_eq!(rig.system.restarts, 0);
    assert!(rig.controller.link().is_connected());
}

#[test]
fn run_ends_on_lost_link_after_feeding_each_good_iteration() {
    let mut rig = Rig::started();
    rig.log.borrow_mut().poll_errors = u32::MAX;
    let mut feeds = 0;

    let err = rig.controller.run(
        &mut rig.board,
        &mut rig.updater,
        &mut rig.system,
        &rig.events,
        || feeds += 1,
    );

    assert_eq!(err, Error::Fatal(FatalError::LinkLost));
    assert_eq!(feeds, 4);
    assert_eq!(rig.system.restarts, 1);
}

#[test]
fn installed_update_ends_the_step_after_restart_request() {
    let mut rig = Rig::started();
    rig.updater = FakeUpdater::installing();
    rig.log.borrow_mut().push_command("OTA");
    rig.board.set_now(1_000);

    let result = rig
        .controller
        .step(&mut rig.board, &mut rig.updater, &mut rig.system, &rig.events);

    assert_eq!(result, Err(Error::Fatal(FatalError::UpdateInstalled)));
    assert_eq!(rig.updater.checks, 1);
    assert_eq!(rig.system.restarts, 1);
}

#[test]
fn run_ends_when_an_update_is_installed() {
    let mut rig = Rig::started();
    rig.updater = FakeUpdater::installing();
    rig.log.borrow_mut().push_command("OTA");
    let mut feeds = 0;

    let err = rig.controller.run(
        &mut rig.board,
        &mut rig.updater,
        &mut rig.system,
        &rig.events,
        || feeds += 1,
    );

    assert_eq!(err, Error::Fatal(FatalError::UpdateInstalled));
    assert_eq!(feeds, 0);
    assert_eq!(rig.system.restarts, 1);
}
