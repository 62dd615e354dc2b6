//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                   | Connects to                 |
//! |------------|------------------------------|-----------------------------|
//! | `hardware` | SignalPort, ActuatorPort     | door inputs, relay, LEDs    |
//! |            | SensorPort, TimePort, DelayNs| (via embedded-hal pins)     |
//! | `bme280`   | SensorPort                   | BME280 over I²C             |
//! | `log_sink` | EventSink                    | Serial log output           |
//! | `mqtt`     | LinkConnector, LinkSession   | ESP-MQTT client             |
//! | `system`   | SystemPort, UpdatePort       | ESP-IDF restart, esp-ota    |
//! | `time`     | TimePort                     | ESP32 system timer, SNTP    |
//! | `wifi`     | -                            | ESP-IDF WiFi STA (boot join)|

pub mod bme280;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod system;
pub mod time;
pub mod wifi;
