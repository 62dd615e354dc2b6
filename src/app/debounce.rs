//! Deferred debounce for the door inputs.
//!
//! Interrupt handlers never sleep.  An edge only *arms* a check deadline for
//! its signal; a periodic service tick runs the tracker handler once the
//! deadline has passed.  Edges that arrive while a check is already armed
//! are absorbed into that check.
//!
//! ```text
//! GPIO ISR ──mark_edge──▶ pending mask ──▶ EdgeService::service(now)
//!                                           │  arm:   now + window
//!                                           │  due:   DoorTracker::handle
//!                                           ▼
//!                                        EventSink
//! ```

use log::debug;

use crate::config::SystemConfig;

use super::door::DoorTracker;
use super::events::Signal;
use super::ports::{EventSink, SignalPort};

/// Per-signal check deadlines.
#[derive(Debug)]
pub struct Debouncer {
    edge_window_ms: u32,
    moving_window_ms: u32,
    deadlines: [Option<u64>; Signal::COUNT],
}

impl Debouncer {
    pub fn new(edge_window_ms: u32, moving_window_ms: u32) -> Self {
        Self {
            edge_window_ms,
            moving_window_ms,
            deadlines: [None; Signal::COUNT],
        }
    }

    /// Debounce window for `signal`.  The moving line gets the long window
    /// to ride out motor-start chatter.
    pub fn window_ms(&self, signal: Signal) -> u32 {
        match signal {
            Signal::Moving => self.moving_window_ms,
            _ => self.edge_window_ms,
        }
    }

    /// Record an edge.  Returns `true` if this armed a new check, `false`
    /// if one was already pending.
    pub fn edge(&mut self, signal: Signal, now_ms: u64) -> bool {
        let due = now_ms + u64::from(self.window_ms(signal));
        let slot = &mut self.deadlines[signal.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(due);
        debug!("debounce: {:?} armed, due at {} ms", signal, due);
        true
    }

    /// Disarm and return every signal whose window has elapsed, in
    /// [`Signal::ALL`] order.
    pub fn take_due(&mut self, now_ms: u64) -> heapless::Vec<Signal, { Signal::COUNT }> {
        let mut due = heapless::Vec::new();
        for signal in Signal::ALL {
            let slot = &mut self.deadlines[signal.index()];
            if matches!(*slot, Some(at) if now_ms >= at) {
                *slot = None;
                // Capacity equals the number of signals.
                let _ = due.push(signal);
            }
        }
        due
    }

    pub fn is_pending(&self, signal: Signal) -> bool {
        self.deadlines[signal.index()].is_some()
    }
}

/// Owns the tracker and its debouncer; lives in the interrupt domain.
#[derive(Debug)]
pub struct EdgeService {
    debouncer: Debouncer,
    tracker: DoorTracker,
}

impl EdgeService {
    pub fn new(config: &SystemConfig, tracker: DoorTracker) -> Self {
        Self {
            debouncer: Debouncer::new(config.edge_debounce_ms, config.moving_debounce_ms),
            tracker,
        }
    }

    /// Feed a pending-edge bitmask (see [`Signal::mask`]) taken from the ISRs.
    pub fn on_edges(&mut self, mask: u8, now_ms: u64) {
        for signal in Signal::ALL {
            if mask & signal.mask() != 0 {
                self.debouncer.edge(signal, now_ms);
            }
        }
    }

    /// Run the handler of every signal whose debounce window has elapsed.
    pub fn service(
        &mut self,
        now_ms: u64,
        pins: &mut impl SignalPort,
        sink: &mut impl EventSink,
    ) {
        for signal in self.debouncer.take_due(now_ms) {
            self.tracker.handle(signal, pins, sink);
        }
    }

    pub fn tracker(&self) -> &DoorTracker {
        &self.tracker
    }
}
