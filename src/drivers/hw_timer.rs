//! Edge-service timer using ESP-IDF's esp_timer API.
//!
//! A 10 ms periodic timer takes the pending edge bits set by the GPIO ISRs,
//! arms debounce deadlines, and runs the door tracker for every deadline
//! that has passed.  Timer callbacks execute in the ESP timer task, not in
//! ISR context, so the tracker never runs inside an interrupt.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::info;

use crate::app::debounce::EdgeService;
use crate::app::ports::{EventSink, SignalPort};
use crate::events::take_edges;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Edge service period.
pub const EDGE_TICK_MS: u64 = 10;

static EDGE_SERVICE: Mutex<CriticalSectionRawMutex, RefCell<Option<EdgeService>>> =
    Mutex::new(RefCell::new(None));

/// One edge-service tick: absorb pending ISR edges and run due handlers.
pub fn edge_tick(now_ms: u64, pins: &mut impl SignalPort, sink: &mut impl EventSink) {
    let mask = take_edges();
    EDGE_SERVICE.lock(|cell| {
        if let Some(service) = cell.borrow_mut().as_mut() {
            service.on_edges(mask, now_ms);
            service.service(now_ms, pins, sink);
        }
    });
}

#[cfg(target_os = "espidf")]
static mut EDGE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_tick_cb(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is a monotonic counter read.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u64;
    let mut sink = crate::adapters::log_sink::LogEventSink::new(crate::events::ChannelSink::new(
        &crate::events::DOOR_EVENTS,
    ));
    edge_tick(now_ms, &mut crate::drivers::hw_init::RawLevels, &mut sink);
}

/// Hand the edge service to the timer domain and start the 10 ms tick.
#[cfg(target_os = "espidf")]
pub fn start_edge_service(service: EdgeService) -> Result<(), i32> {
    EDGE_SERVICE.lock(|cell| *cell.borrow_mut() = Some(service));

    // SAFETY: EDGE_TIMER is written here once at boot from the main task,
    // before the timer can fire.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(edge_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"door-edges".as_ptr(),
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut EDGE_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: edge timer create failed (rc={})", ret);
            return Err(ret);
        }
        let ret = esp_timer_start_periodic(EDGE_TIMER, EDGE_TICK_MS * 1_000);
        if ret != ESP_OK {
            log::error!("hw_timer: edge timer start failed (rc={})", ret);
            return Err(ret);
        }
    }
    info!("hw_timer: edge service every {} ms", EDGE_TICK_MS);
    Ok(())
}

/// Simulation: installs the service; the caller drives [`edge_tick`].
#[cfg(not(target_os = "espidf"))]
pub fn start_edge_service(service: EdgeService) -> Result<(), i32> {
    EDGE_SERVICE.lock(|cell| *cell.borrow_mut() = Some(service));
    info!("hw_timer(sim): edge service installed, no timer");
    Ok(())
}
