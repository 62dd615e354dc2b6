//! Application core: pure domain logic, zero I/O.
//!
//! Door state tracking, deferred debounce, command dispatch, telemetry and
//! the link retry policy.  All interaction with hardware and the broker
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod debounce;
pub mod dispatch;
pub mod door;
pub mod events;
pub mod link;
pub mod ports;
pub mod service;
pub mod telemetry;
