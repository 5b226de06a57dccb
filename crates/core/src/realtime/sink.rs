use log::warn;

use super::event::HubEvent;
use super::hub::HubHandle;
use crate::events::{DomainEvent, DomainEventSink};

/// Forwards user-scoped domain events to the hub as `portfolio_update`.
///
/// Publishing is fire-and-forget so ledger writers never wait on the hub.
/// Catalog events carry no user and are not forwarded.
pub struct HubEventSink {
    hub: HubHandle,
}

impl HubEventSink {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }
}

impl DomainEventSink for HubEventSink {
    fn emit(&self, event: DomainEvent) {
        let Some(user_id) = event.user_id().map(str::to_string) else {
            return;
        };
        if let Err(e) = self.hub.try_publish(HubEvent::portfolio_update(user_id, event)) {
            warn!("Dropped portfolio update: {}", e);
        }
    }
}
