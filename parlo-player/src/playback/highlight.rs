//! Highlight synchronizer
//!
//! Keeps exactly one segment marked as active. Every change unmarks all
//! segments before marking the new one, so a sink never shows two.

use parlo_common::events::{EventBus, ParloEvent};
use std::sync::Arc;
use tracing::trace;

/// Presentation side of highlighting
pub trait HighlightSink: Send + Sync {
    fn unmark_all(&mut self);

    /// Mark `index` active and optionally bring it into view
    fn mark(&mut self, index: usize, scroll_into_view: bool);
}

/// Publishes highlight changes on the event bus for SSE clients
pub struct EventBusHighlightSink {
    events: Arc<EventBus>,
}

impl EventBusHighlightSink {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self { events }
    }
}

impl HighlightSink for EventBusHighlightSink {
    fn unmark_all(&mut self) {
        self.events.emit_lossy(ParloEvent::HighlightCleared {
            timestamp: chrono::Utc::now(),
        });
    }

    fn mark(&mut self, index: usize, scroll_into_view: bool) {
        self.events.emit_lossy(ParloEvent::SegmentHighlighted {
            index,
            scroll_into_view,
            timestamp: chrono::Utc::now(),
        });
    }
}

pub struct HighlightSynchronizer {
    sink: Box<dyn HighlightSink>,
    active: Option<usize>,
}

impl HighlightSynchronizer {
    pub fn new(sink: Box<dyn HighlightSink>) -> Self {
        Self { sink, active: None }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Make `index` the single active segment
    pub fn show(&mut self, index: usize) {
        if self.active == Some(index) {
            return;
        }
        trace!("Highlight {:?} -> {}", self.active, index);
        self.sink.unmark_all();
        self.sink.mark(index, true);
        self.active = Some(index);
    }

    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            trace!("Highlight cleared");
            self.sink.unmark_all();
        }
    }
}
