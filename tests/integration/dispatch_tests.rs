//! Command dispatcher against mock board, link and system collaborators.

use garagemon::app::commands::CommandOutcome;
use garagemon::app::dispatch::{
    CommandDispatcher, INFO_BME_FAILED, INFO_BME_OK, INFO_NO_UPDATE, INFO_RELAY_PULSE,
    INFO_TOO_EARLY, INFO_UNKNOWN, INFO_UPDATE_INSTALLED, INFO_UPDATE_RECEIVED,
};
use garagemon::config::SystemConfig;

use crate::mock_hw::{
    FakeUpdater, HwCall, MockBoard, RecordingSession, RecordingSystem, SharedLink,
};

struct Rig {
    dispatcher: CommandDispatcher,
    board: MockBoard,
    link: RecordingSession,
    log: SharedLink,
    updater: FakeUpdater,
    system: RecordingSystem,
}

impl Rig {
    fn new(now_ms: u64) -> Self {
        let log = SharedLink::default();
        Self {
            dispatcher: CommandDispatcher::new(&SystemConfig::default()),
            board: MockBoard::at(now_ms),
            link: RecordingSession::new(log.clone()),
            log,
            updater: FakeUpdater::default(),
            system: RecordingSystem::default(),
        }
    }

    fn send(&mut self, payload: &str) -> CommandOutcome {
        self.dispatcher.handle_command(
            "pipicow",
            payload.as_bytes(),
            &mut self.link,
            &mut self.board,
            &mut self.updater,
            &mut self.system,
        )
    }

    fn infos(&self) -> Vec<String> {
        self.log.borrow().infos().into_iter().map(String::from).collect()
    }
}

// ── Relay pulse ───────────────────────────────────────────────

#[test]
fn door_command_pulses_relay_for_configured_hold() {
    let mut rig = Rig::new(10_000);

    assert_eq!(rig.send("trigger door now"), CommandOutcome::Pulsed);

    assert_eq!(rig.board.relay_calls(), vec![(10_000, true), (10_500, false)]);
    assert!(rig.board.calls.contains(&(10_000, HwCall::Delay(500))));
    assert_eq!(rig.infos(), vec![INFO_RELAY_PULSE]);
    assert_eq!(rig.dispatcher.last_trigger_ms(), Some(10_500));
}

#[test]
fn first_pulse_after_boot_is_accepted_immediately() {
    let mut rig = Rig::new(0);
    assert_eq!(rig.send("door"), CommandOutcome::Pulsed);
}

#[test]
fn second_pulse_inside_window_is_rejected() {
    let mut rig = Rig::new(10_000);
    assert_eq!(rig.send("door"), CommandOutcome::Pulsed);
    let last = rig.dispatcher.last_trigger_ms().unwrap();

    rig.board.set_now(last + 4_900);
    assert_eq!(rig.send("door"), CommandOutcome::RateLimited);
    assert_eq!(rig.board.relay_calls().len(), 2, "rejected pulse must not touch the relay");
    assert_eq!(rig.dispatcher.last_trigger_ms(), Some(last));
    assert_eq!(rig.infos().last().map(String::as_str), Some(INFO_TOO_EARLY));

    rig.board.set_now(last + 5_100);
    assert_eq!(rig.send("door"), CommandOutcome::Pulsed);
    assert_eq!(rig.board.relay_calls().len(), 4);
}

#[test]
fn rejection_does_not_extend_the_window() {
    let mut rig = Rig::new(0);
    assert_eq!(rig.send("door"), CommandOutcome::Pulsed);
    let last = rig.dispatcher.last_trigger_ms().unwrap();

    for offset in [1_000, 2_000, 4_999] {
        rig.board.set_now(last + offset);
        assert_eq!(rig.send("door"), CommandOutcome::RateLimited);
    }
    rig.board.set_now(last + 5_000);
    assert_eq!(rig.send("door"), CommandOutcome::Pulsed);
}

// ── Sensor request ────────────────────────────────────────────

#[test]
fn bme_request_publishes_reading_and_reports_success() {
    let mut rig = Rig::new(0);
    assert_eq!(rig.send("BME read"), CommandOutcome::SensorPublished);

    let log = rig.log.borrow();
    assert_eq!(log.on("pipicow/bme280/temperature"), vec!["21.50"]);
    assert_eq!(log.on("pipicow/bme280/pressure"), vec!["1013.25"]);
    assert_eq!(log.on("pipicow/bme280/humidity"), vec!["45.00"]);
    assert_eq!(log.infos(), vec![INFO_BME_OK]);
}

#[test]
fn bme_failure_is_reported_not_propagated() {
    let mut rig = Rig::new(0);
    rig.board.sensor_fails = true;

    assert_eq!(rig.send("BME read"), CommandOutcome::SensorFailed);
    assert_eq!(rig.infos(), vec![INFO_BME_FAILED]);
    assert!(rig.log.borrow().on("pipicow/bme280/temperature").is_empty());
}

// ── Update ────────────────────────────────────────────────────

#[test]
fn ota_without_update_keeps_running() {
    let mut rig = Rig::new(0);
    assert_eq!(rig.send("OTA"), CommandOutcome::UpdateUnavailable);
    assert_eq!(rig.infos(), vec![INFO_UPDATE_RECEIVED, INFO_NO_UPDATE]);
    assert_eq!(rig.updater.checks, 1);
    assert_eq!(rig.system.restarts, 0);
}

#[test]
fn installed_update_restarts_after_grace_delay() {
    let mut rig = Rig::new(0);
    rig.updater = FakeUpdater::installing();

    assert_eq!(rig.send("OTA now"), CommandOutcome::Restarting);
    assert_eq!(rig.infos(), vec![INFO_UPDATE_RECEIVED, INFO_UPDATE_INSTALLED]);
    assert_eq!(rig.board.delays(), vec![500]);
    assert_eq!(rig.system.restarts, 1);
}

// ── Vocabulary ────────────────────────────────────────────────

#[test]
fn unknown_payloads_are_answered_and_ignored() {
    let mut rig = Rig::new(0);
    assert_eq!(rig.send("hello"), CommandOutcome::Unknown);
    assert_eq!(rig.send("open the DOOR"), CommandOutcome::Unknown);
    assert_eq!(rig.infos(), vec![INFO_UNKNOWN, INFO_UNKNOWN]);
    assert!(rig.board.relay_calls().is_empty());
}

#[test]
fn non_utf8_payload_is_unknown() {
    let mut rig = Rig::new(0);
    let outcome = rig.dispatcher.handle_command(
        "pipicow",
        &[0xc3, 0x28, b'd', b'o', b'o', b'r'],
        &mut rig.link,
        &mut rig.board,
        &mut rig.updater,
        &mut rig.system,
    );
    assert_eq!(outcome, CommandOutcome::Unknown);
}

#[test]
fn door_beats_bme_when_both_present() {
    let mut rig = Rig::new(0);
    assert_eq!(rig.send("BME and door"), CommandOutcome::Pulsed);
    assert_eq!(rig.board.sensor_reads, 0);
}

#[test]
fn info_failure_does_not_block_the_pulse() {
    let mut rig = Rig::new(0);
    rig.log.borrow_mut().fail_publish = true;
    assert_eq!(rig.send("door"), CommandOutcome::Pulsed);
    assert_eq!(rig.board.relay_calls().len(), 2);
}
