//! Door state tracker.
//!
//! Turns debounced edge notifications into a mutually-exclusive door
//! position plus an independent obstruction latch, and emits an
//! [`AppEvent`] on every real transition.
//!
//! ```text
//!            open edge            closed edge
//!   ┌──────────────────▶ Open ◀───┐    ┌──▶ Closed
//!   │                              │    │
//! Unknown ── moving edge ──▶ Moving ◀──▶ Stopped   (moving edge toggles)
//!
//! Obstructed: sticky latch, layered on top of the position.
//! ```
//!
//! The position is a single enum, so "at most one of Open / Closed / Moving"
//! holds by construction rather than by clearing three flags in the right
//! order.  Handlers never fail: a downstream publish problem is the sink's
//! business and only shows up as a missed telemetry event.

use log::{debug, info};

use super::events::{AppEvent, Signal};
use super::ports::{EventSink, SignalPort};

/// Externally reported door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
    Moving,
    Stopped,
    Obstructed,
    Unknown,
}

/// Exclusive position.  `Obstructed` is deliberately absent: it is a latch,
/// not a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Unknown,
    Open,
    Closed,
    Moving,
    Stopped,
}

/// Owns the door flags for the lifetime of the process.
#[derive(Debug)]
pub struct DoorTracker {
    position: Position,
    obstructed: bool,
}

impl Default for DoorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DoorTracker {
    pub fn new() -> Self {
        Self {
            position: Position::Unknown,
            obstructed: false,
        }
    }

    /// Seed the position from raw limit-switch levels at boot.  Emits
    /// nothing; an ambiguous or idle reading stays `Unknown`.
    pub fn seed(&mut self, open_level: bool, closed_level: bool) {
        self.position = match (open_level, closed_level) {
            (true, false) => Position::Open,
            (false, true) => Position::Closed,
            _ => Position::Unknown,
        };
        info!("door: seeded as {:?}", self.state());
    }

    // ── Edge handlers (run after the debounce window) ─────────

    /// Open limit switch reached.
    pub fn on_open_edge(&mut self, sink: &mut impl EventSink) {
        if self.position == Position::Open {
            debug!("door: open edge ignored (already open)");
            return;
        }
        self.position = Position::Open;
        self.emit(AppEvent::Opened, sink);
    }

    /// Closed limit switch reached.
    pub fn on_closed_edge(&mut self, sink: &mut impl EventSink) {
        if self.position == Position::Closed {
            debug!("door: closed edge ignored (already closed)");
            return;
        }
        self.position = Position::Closed;
        self.emit(AppEvent::Closed, sink);
    }

    /// Motor relay pulsed.  The same wire pulses on start and on stop, so
    /// this is a flip-flop rather than a level.
    pub fn on_moving_edge(&mut self, sink: &mut impl EventSink) {
        if self.position == Position::Moving {
            self.position = Position::Stopped;
            self.emit(AppEvent::Stopped, sink);
        } else {
            self.position = Position::Moving;
            self.emit(AppEvent::Moving, sink);
        }
    }

    /// Obstruction beam broken.  Sticky: nothing in this module clears it.
    pub fn on_obstructed_edge(&mut self, sink: &mut impl EventSink) {
        if self.obstructed {
            return;
        }
        self.obstructed = true;
        self.emit(AppEvent::Obstructed, sink);
    }

    /// PIR edge.  Re-samples the input and reports motion only if it is
    /// still asserted after the debounce window.
    pub fn on_motion_edge(&mut self, pins: &mut impl SignalPort, sink: &mut impl EventSink) {
        if pins.level(Signal::Motion) {
            self.emit(AppEvent::Motion, sink);
        } else {
            debug!("door: PIR spike cleared before debounce check");
        }
    }

    /// Route a debounced signal to its handler.
    pub fn handle(
        &mut self,
        signal: Signal,
        pins: &mut impl SignalPort,
        sink: &mut impl EventSink,
    ) {
        match signal {
            Signal::Open => self.on_open_edge(sink),
            Signal::Closed => self.on_closed_edge(sink),
            Signal::Moving => self.on_moving_edge(sink),
            Signal::Obstructed => self.on_obstructed_edge(sink),
            Signal::Motion => self.on_motion_edge(pins, sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current position (never `Obstructed`).
    pub fn state(&self) -> DoorState {
        match self.position {
            Position::Unknown => DoorState::Unknown,
            Position::Open => DoorState::Open,
            Position::Closed => DoorState::Closed,
            Position::Moving => DoorState::Moving,
            Position::Stopped => DoorState::Stopped,
        }
    }

    /// Position with the obstruction latch taking precedence.
    pub fn reported_state(&self) -> DoorState {
        if self.obstructed {
            DoorState::Obstructed
        } else {
            self.state()
        }
    }

    pub fn is_open(&self) -> bool {
        self.position == Position::Open
    }

    pub fn is_closed(&self) -> bool {
        self.position == Position::Closed
    }

    pub fn is_moving(&self) -> bool {
        self.position == Position::Moving
    }

    pub fn is_obstructed(&self) -> bool {
        self.obstructed
    }

    fn emit(&self, event: AppEvent, sink: &mut impl EventSink) {
        debug!("door: {}", event.payload());
        sink.emit(event);
    }
}
