//! Interrupt-driven event plumbing.
//!
//! Two hand-offs cross the interrupt / main-loop boundary:
//!
//! ```text
//! ┌─────────────┐  mark_edge   ┌──────────────┐  take_edges  ┌──────────────┐
//! │ GPIO ISRs   │─────────────▶│ pending mask │─────────────▶│ edge service │
//! └─────────────┘  (atomic or) └──────────────┘  (swap 0)    │  (10 ms tick)│
//!                                                            └──────┬───────┘
//!                                                       ChannelSink │ try_send
//!                                                                   ▼
//! ┌──────────────┐        drain_door_events          ┌─────────────────────┐
//! │  Main loop   │◀──────────────────────────────────│ DOOR_EVENTS channel │
//! └──────────────┘                                   └─────────────────────┘
//! ```
//!
//! The ISR side only ever sets bits, so it is wait-free and never blocks.

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::events::{AppEvent, Signal};
use crate::app::ports::EventSink;

/// Door events that may be waiting for the main loop.  A burst larger than
/// this in one loop quantum drops the newest events.
pub const DOOR_EVENT_CAP: usize = 8;

// ── ISR pending mask ──────────────────────────────────────────

/// One bit per [`Signal`], set by ISRs and cleared by the edge service.
pub struct PendingEdges(AtomicU8);

impl Default for PendingEdges {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingEdges {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn mark(&self, signal: Signal) {
        self.0.fetch_or(signal.mask(), Ordering::Release);
    }

    pub fn take(&self) -> u8 {
        self.0.swap(0, Ordering::AcqRel)
    }
}

static PENDING_EDGES: PendingEdges = PendingEdges::new();

/// Record an edge on `signal`.  Safe to call from ISR context.
pub fn mark_edge(signal: Signal) {
    PENDING_EDGES.mark(signal);
}

/// Take and clear every pending edge bit.
pub fn take_edges() -> u8 {
    PENDING_EDGES.take()
}

// ── Door event channel ────────────────────────────────────────

/// Door transitions on their way from the edge service to the main loop.
pub static DOOR_EVENTS: Channel<CriticalSectionRawMutex, AppEvent, DOOR_EVENT_CAP> =
    Channel::new();

/// [`EventSink`] that forwards into a bounded channel without blocking.
pub struct ChannelSink<'a> {
    channel: &'a Channel<CriticalSectionRawMutex, AppEvent, DOOR_EVENT_CAP>,
}

impl<'a> ChannelSink<'a> {
    pub fn new(channel: &'a Channel<CriticalSectionRawMutex, AppEvent, DOOR_EVENT_CAP>) -> Self {
        Self { channel }
    }
}

impl EventSink for ChannelSink<'_> {
    fn emit(&mut self, event: AppEvent) {
        if self.channel.try_send(event).is_err() {
            warn!("events: queue full, dropped {:?}", event);
        }
    }
}

/// Drain all queued door events into a callback, in FIFO order.
pub fn drain_door_events(
    channel: &Channel<CriticalSectionRawMutex, AppEvent, DOOR_EVENT_CAP>,
    mut handler: impl FnMut(AppEvent),
) {
    while let Ok(event) = channel.try_receive() {
        handler(event);
    }
}
