//! Link manager: bounded connect retries and sustained-failure restarts.

use garagemon::app::link::LinkManager;
use garagemon::app::ports::Publisher;
use garagemon::config::SystemConfig;
use garagemon::error::{Error, FatalError, LinkError};

use crate::mock_hw::{MockBoard, RecordingSystem, ScriptedConnector};

#[test]
fn connects_after_transient_failures() {
    let (connector, log) = ScriptedConnector::new(2);
    let mut link = LinkManager::new(connector, &SystemConfig::default());
    let mut board = MockBoard::new();
    let mut system = RecordingSystem::default();

    assert!(link.connect(&mut board, &mut system).is_ok());
    assert!(link.is_connected());
    assert_eq!(log.borrow().open_attempts, 3);
    assert_eq!(log.borrow().subscriptions, vec!["pipicow".to_string()]);
    assert_eq!(board.delays(), vec![3_000, 3_000]);
    assert_eq!(system.restarts, 0);
}

#[test]
fn five_failures_restart_without_a_sixth_attempt() {
    let (connector, log) = ScriptedConnector::new(u32::MAX);
    let mut link = LinkManager::new(connector, &SystemConfig::default());
    let mut board = MockBoard::new();
    let mut system = RecordingSystem::default();

    let result = link.connect(&mut board, &mut system);

    assert_eq!(result, Err(Error::Fatal(FatalError::LinkExhausted)));
    assert_eq!(log.borrow().open_attempts, 5);
    assert_eq!(system.restarts, 1);
    // Pauses between attempts only, none after the last.
    assert_eq!(board.delays(), vec![3_000; 4]);
    assert!(!link.is_connected());
}

#[test]
fn sustained_poll_failure_restarts() {
    let (connector, log) = ScriptedConnector::new(0);
    let mut link = LinkManager::new(connector, &SystemConfig::default());
    let mut board = MockBoard::new();
    let mut system = RecordingSystem::default();
    link.connect(&mut board, &mut system).unwrap();

    log.borrow_mut().poll_errors = 10;
    for n in 1..5 {
        assert_eq!(link.poll(&mut system), Ok(None));
        assert_eq!(link.consecutive_failures(), n);
    }
    assert_eq!(link.poll(&mut system), Err(Error::Fatal(FatalError::LinkLost)));
    assert_eq!(system.restarts, 1);
    assert!(!link.is_connected());
}

#[test]
fn a_good_poll_resets_the_failure_count() {
    let (connector, log) = ScriptedConnector::new(0);
    let mut link = LinkManager::new(connector, &SystemConfig::default());
    let mut board = MockBoard::new();
    let mut system = RecordingSystem::default();
    link.connect(&mut board, &mut system).unwrap();

    for _ in 0..3 {
        log.borrow_mut().poll_errors = 4;
        for _ in 0..4 {
            assert!(link.poll(&mut system).is_ok());
        }
        assert!(link.poll(&mut system).is_ok());
        assert_eq!(link.consecutive_failures(), 0);
    }
    assert_eq!(system.restarts, 0);
}

#[test]
fn poll_returns_one_message_at_a_time() {
    let (connector, log) = ScriptedConnector::new(0);
    let mut link = LinkManager::new(connector, &SystemConfig::default());
    let mut board = MockBoard::new();
    let mut system = RecordingSystem::default();
    link.connect(&mut board, &mut system).unwrap();

    log.borrow_mut().push_command("door");
    log.borrow_mut().push_command("BME");
    let first = link.poll(&mut system).unwrap().unwrap();
    assert_eq!(&first.payload[..], b"door");
    let second = link.poll(&mut system).unwrap().unwrap();
    assert_eq!(&second.payload[..], b"BME");
    assert_eq!(link.poll(&mut system), Ok(None));
}

#[test]
fn publish_without_session_fails() {
    let (connector, _log) = ScriptedConnector::new(0);
    let mut link = LinkManager::new(connector, &SystemConfig::default());
    assert_eq!(link.publish("pipicow/info", b"x"), Err(LinkError::NotConnected));
}
