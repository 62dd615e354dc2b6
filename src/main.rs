//! Garage monitor firmware main entry point.
//!
//! Hexagonal architecture: the [`Controller`] runs the main loop against
//! port traits, the edge service runs the door tracker in the ESP timer
//! task, and the adapters below bind both to the ESP32-S3 board.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        Bme280Sensor   Esp32TimeAdapter        │
//! │  (Signal+Actuator+...)  (SensorPort)   (TimePort)              │
//! │  MqttConnector          EspSystem      OtaUpdater              │
//! │  (LinkConnector)        (SystemPort)   (UpdatePort)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             Controller (pure logic)                    │    │
//! │  │  LinkManager · CommandDispatcher · Telemetry           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · EdgeService (10 ms timer)       │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{anyhow, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};

use garagemon::adapters::bme280::Bme280Sensor;
use garagemon::adapters::hardware::HardwareAdapter;
use garagemon::adapters::mqtt::MqttConnector;
use garagemon::adapters::system::{check_rollback, EspSystem, OtaUpdater};
use garagemon::adapters::time::{sync_wall_clock, Esp32TimeAdapter};
use garagemon::adapters::wifi;
use garagemon::app::debounce::EdgeService;
use garagemon::app::door::DoorTracker;
use garagemon::app::events::Signal;
use garagemon::app::ports::SystemPort;
use garagemon::app::service::Controller;
use garagemon::config::{self, secrets};
use garagemon::drivers::hw_init::{self, RawPin};
use garagemon::drivers::hw_timer::start_edge_service;
use garagemon::drivers::watchdog::Watchdog;
use garagemon::error::{Error, FatalError};
use garagemon::events::DOOR_EVENTS;
use garagemon::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("garagemon v{}", env!("CARGO_PKG_VERSION"));
    check_rollback();

    // ── 2. Configuration ──────────────────────────────────────
    let config = config::load(config::CONFIG_JSON);

    // ── 3. Pins and peripherals ───────────────────────────────
    hw_init::init_gpio()?;
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // SDA/SCL match pins::I2C_SDA_GPIO / I2C_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;

    let mut hw = HardwareAdapter::new(
        Signal::ALL.map(|s| RawPin::new(pins::signal_gpio(s))),
        RawPin::new(pins::DOOR_TRIGGER_GPIO),
        RawPin::new(pins::ALIVE_LED_GPIO),
        RawPin::new(pins::BOARD_LED_GPIO),
        Bme280Sensor::new(i2c),
        Esp32TimeAdapter::new(),
        FreeRtos,
    );
    let mut system = EspSystem;
    let connector = MqttConnector::new(&config);
    let mut controller = Controller::new(config, connector);

    // ── 4. Boot blink ─────────────────────────────────────────
    controller.boot_blink(&mut hw);

    // ── 5. Network and wall clock ─────────────────────────────
    let _wifi = match wifi::join(
        peripherals.modem,
        sysloop,
        nvs,
        secrets::WIFI_SSID,
        secrets::WIFI_PASSWORD,
    ) {
        Ok(link) => link,
        Err(e) => {
            error!("boot: wifi join failed: {}", e);
            system.restart();
            return Err(Error::Fatal(FatalError::NetworkUnavailable).into());
        }
    };
    let _clock = sync_wall_clock();

    // ── 6. Broker link (bounded retries, then restart) ────────
    controller.connect(&mut hw, &mut system)?;

    // ── 7. Door tracker, ISRs and edge service ────────────────
    let mut tracker = DoorTracker::new();
    tracker.seed(
        hw_init::gpio_read(pins::DOOR_OPEN_GPIO),
        hw_init::gpio_read(pins::DOOR_CLOSED_GPIO),
    );
    info!("boot: door seeded as {:?}", tracker.reported_state());
    hw_init::init_isr_service()?;
    start_edge_service(EdgeService::new(controller.config(), tracker))
        .map_err(|rc| anyhow!("edge service timer failed (rc={})", rc))?;

    // ── 8. Initial telemetry, then the main loop ──────────────
    controller.start(&mut hw);
    let watchdog = Watchdog::new();
    let mut updater = OtaUpdater::new(secrets::OTA_URL);

    let err = controller.run(&mut hw, &mut updater, &mut system, &DOOR_EVENTS, || {
        watchdog.feed();
    });
    error!("main loop ended: {}", err);
    Err(err.into())
}
