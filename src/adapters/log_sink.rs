//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each door event to the ESP-IDF
//! logger (UART / USB-CDC in production) and then forwarding it to an
//! inner sink, normally the channel towards the main loop.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] before passing it on.
pub struct LogEventSink<S> {
    inner: S,
}

impl<S: EventSink> LogEventSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for LogEventSink<S> {
    fn emit(&mut self, event: AppEvent) {
        match event {
            AppEvent::Motion => info!("EVENT | pir={}", event.payload()),
            _ => info!("EVENT | door={}", event.payload()),
        }
        self.inner.emit(event);
    }
}
