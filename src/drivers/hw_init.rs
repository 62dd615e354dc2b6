//! One-shot GPIO initialization and raw pin access.
//!
//! Configures the door inputs, the relay and the LEDs with raw ESP-IDF sys
//! calls, and installs the per-pin edge ISRs.  Called once from `main()`
//! before the main loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::events::Signal;
use crate::app::ports::SignalPort;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── GPIO configuration ────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_gpio() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the edge service and ISRs are
    // installed; nothing else touches these pins yet.
    unsafe {
        for signal in Signal::ALL {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::signal_gpio(signal),
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            let ret = gpio_config(&cfg);
            if ret != ESP_OK {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
        }

        // Relay idles HIGH; set the level before switching to output so the
        // door never sees a low glitch at boot.
        let outputs = [
            (pins::DOOR_TRIGGER_GPIO, 1),
            (pins::ALIVE_LED_GPIO, 0),
            (pins::BOARD_LED_GPIO, 0),
        ];
        for (pin, idle) in outputs {
            gpio_set_level(pin, idle);
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            let ret = gpio_config(&cfg);
            if ret != ESP_OK {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
            gpio_set_level(pin, idle);
        }
    }
    info!("hw_init: door inputs, relay and LEDs configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_gpio() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): GPIO init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access; safe from
    // task, timer and ISR context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

// ── Raw pins behind embedded-hal ──────────────────────────────

/// A GPIO already configured by [`init_gpio`], exposed through the
/// `embedded-hal` digital traits.
#[derive(Debug)]
pub struct RawPin {
    gpio: i32,
    #[cfg(not(target_os = "espidf"))]
    level: bool,
}

impl RawPin {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            #[cfg(not(target_os = "espidf"))]
            level: false,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl embedded_hal::digital::ErrorType for RawPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for RawPin {
    #[cfg(target_os = "espidf")]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.gpio))
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl embedded_hal::digital::OutputPin for RawPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

impl RawPin {
    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) {
        // SAFETY: the pin was configured as an output in init_gpio(); only
        // the main task owns this handle.
        unsafe {
            gpio_set_level(self.gpio, u32::from(high));
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) {
        self.level = high;
    }
}

/// Reads door inputs straight from the pad registers.  Used by the edge
/// service, which runs outside the main task and cannot borrow its pins.
pub struct RawLevels;

impl SignalPort for RawLevels {
    #[cfg(target_os = "espidf")]
    fn level(&mut self, signal: Signal) -> bool {
        gpio_read(pins::signal_gpio(signal))
    }

    #[cfg(not(target_os = "espidf"))]
    fn level(&mut self, _signal: Signal) -> bool {
        false
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Edge ISR shared by every door input.  `arg` carries the signal index.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn door_gpio_isr(arg: *mut core::ffi::c_void) {
    if let Some(signal) = Signal::ALL.get(arg as usize) {
        crate::events::mark_edge(*signal);
    }
}

/// Install the GPIO ISR service and register the door edge handlers.
/// Rising edge for open, closed, obstructed and PIR; both edges for the
/// moving relay line.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handler only sets an atomic bit.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for signal in Signal::ALL {
            let pin = pins::signal_gpio(signal);
            let edge = match signal {
                Signal::Moving => gpio_int_type_t_GPIO_INTR_ANYEDGE,
                _ => gpio_int_type_t_GPIO_INTR_POSEDGE,
            };
            gpio_set_intr_type(pin, edge);
            let ret = gpio_isr_handler_add(
                pin,
                Some(door_gpio_isr),
                signal.index() as *mut core::ffi::c_void,
            );
            if ret != ESP_OK {
                return Err(HwInitError::IsrInstallFailed(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    info!("hw_init: door ISRs installed (open, closed, moving, obstructed, pir)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
