//! BME280 environment sensor adapter.
//!
//! On the device this wraps the `bme280` crate's I²C driver; every
//! [`SensorPort::read_environment`] call triggers a fresh forced-mode
//! measurement.  If the init sequence failed at boot it is retried on the
//! next read, so a sensor plugged in late still comes up.

use crate::app::ports::SensorReading;
use crate::error::SensorError;

/// Convert a raw measurement (pressure in pascal) into a reading.  A
/// non-finite channel means the device skipped it.
pub fn reading_from_raw(
    temperature: f32,
    pressure_pa: f32,
    humidity: f32,
) -> Result<SensorReading, SensorError> {
    if !temperature.is_finite() || !pressure_pa.is_finite() || !humidity.is_finite() {
        return Err(SensorError::IncompleteReading);
    }
    Ok(SensorReading {
        temperature,
        pressure: pressure_pa / 100.0,
        humidity,
    })
}

#[cfg(target_os = "espidf")]
mod esp {
    use ::bme280::i2c::BME280;
    use esp_idf_svc::hal::delay::Ets;
    use esp_idf_svc::hal::i2c::I2cDriver;
    use log::{info, warn};

    use super::reading_from_raw;
    use crate::app::ports::{SensorPort, SensorReading};
    use crate::error::SensorError;

    pub struct Bme280Sensor {
        dev: BME280<I2cDriver<'static>>,
        ready: bool,
    }

    impl Bme280Sensor {
        /// Bind to the primary address (0x76) and run the init sequence.
        pub fn new(i2c: I2cDriver<'static>) -> Self {
            let mut sensor = Self { dev: BME280::new_primary(i2c), ready: false };
            sensor.ensure_ready();
            sensor
        }

        fn ensure_ready(&mut self) -> bool {
            if !self.ready {
                match self.dev.init(&mut Ets) {
                    Ok(()) => {
                        info!("bme280: initialised");
                        self.ready = true;
                    }
                    Err(e) => warn!("bme280: init failed: {:?}", e),
                }
            }
            self.ready
        }
    }

    impl SensorPort for Bme280Sensor {
        fn read_environment(&mut self) -> Result<SensorReading, SensorError> {
            if !self.ensure_ready() {
                return Err(SensorError::NotInitialised);
            }
            let m = self.dev.measure(&mut Ets).map_err(|e| {
                warn!("bme280: measure failed: {:?}", e);
                SensorError::BusFailed
            })?;
            reading_from_raw(m.temperature, m.pressure, m.humidity)
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::Bme280Sensor;
