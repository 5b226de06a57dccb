//! Where domain events go after a write commits.

use std::sync::{Arc, Mutex, PoisonError};

use super::DomainEvent;

/// Receives domain events from ledger and catalog writes.
///
/// `emit` runs on the writer's path after the commit, so it must not block
/// or fail the write. Sinks that do real work hand the event off to a queue.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Discards every event.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Keeps every event in emission order. Used by service tests.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Forwards every event to each inner sink in registration order.
#[derive(Clone, Default)]
pub struct FanOutDomainEventSink {
    sinks: Vec<Arc<dyn DomainEventSink>>,
}

impl FanOutDomainEventSink {
    pub fn new(sinks: Vec<Arc<dyn DomainEventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn DomainEventSink>) {
        self.sinks.push(sink);
    }
}

impl DomainEventSink for FanOutDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }
}
