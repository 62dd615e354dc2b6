//! GPIO / peripheral pin assignments for the garage monitor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Strapping pins (0, 3, 45, 46) are avoided.

use crate::app::events::Signal;

// ---------------------------------------------------------------------------
// Door inputs (pull-down, active HIGH)
// ---------------------------------------------------------------------------

/// Limit switch at the fully-open position.
pub const DOOR_OPEN_GPIO: i32 = 4;
/// Limit switch at the fully-closed position.
pub const DOOR_CLOSED_GPIO: i32 = 5;
/// Opener's motor relay contact; pulses on start and stop.
pub const DOOR_MOVING_GPIO: i32 = 6;
/// Obstruction photo-beam.
pub const DOOR_OBSTRUCTED_GPIO: i32 = 7;
/// PIR motion sensor.
pub const PIR_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Door trigger relay.  Active LOW, idles HIGH.
pub const DOOR_TRIGGER_GPIO: i32 = 16;
/// External "alive" LED.
pub const ALIVE_LED_GPIO: i32 = 17;
/// On-board LED.
pub const BOARD_LED_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// BME280 (I²C)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_FREQ_HZ: u32 = 100_000;

/// GPIO number for a door input signal.
pub const fn signal_gpio(signal: Signal) -> i32 {
    match signal {
        Signal::Open => DOOR_OPEN_GPIO,
        Signal::Closed => DOOR_CLOSED_GPIO,
        Signal::Moving => DOOR_MOVING_GPIO,
        Signal::Obstructed => DOOR_OBSTRUCTED_GPIO,
        Signal::Motion => PIR_GPIO,
    }
}
