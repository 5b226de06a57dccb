//! Bounded per-client event queue that drops the oldest entry when full.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use super::event::HubEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientState {
    Connecting,
    Connected,
    /// Terminal. Queued events are discarded and nothing new is accepted.
    Disconnected,
}

struct Inner {
    queue: VecDeque<HubEvent>,
    state: ClientState,
    dropped: u64,
}

pub(crate) struct Mailbox {
    inner: Mutex<Inner>,
    notify: Notify,
    capacity: usize,
}

impl Mailbox {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                state: ClientState::Connecting,
                dropped: 0,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `event` without blocking. Returns false if an older event was dropped
    /// to make room, or if the mailbox is closed.
    pub(crate) fn push(&self, event: HubEvent) -> bool {
        let mut inner = self.lock();
        if inner.state == ClientState::Disconnected {
            return false;
        }
        let mut kept_all = true;
        if inner.queue.len() >= self.capacity {
            inner.queue.pop_front();
            inner.dropped += 1;
            kept_all = false;
        }
        inner.queue.push_back(event);
        drop(inner);
        self.notify.notify_one();
        kept_all
    }

    pub(crate) async fn recv(&self) -> Option<HubEvent> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.lock();
                if let Some(event) = inner.queue.pop_front() {
                    return Some(event);
                }
                if inner.state == ClientState::Disconnected {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub(crate) fn try_recv(&self) -> Option<HubEvent> {
        self.lock().queue.pop_front()
    }

    pub(crate) fn mark_connected(&self) {
        let mut inner = self.lock();
        if inner.state == ClientState::Connecting {
            inner.state = ClientState::Connected;
        }
    }

    /// Moves to `Disconnected` and discards anything still queued.
    pub(crate) fn close(&self) {
        {
            let mut inner = self.lock();
            inner.state = ClientState::Disconnected;
            inner.queue.clear();
        }
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub(crate) fn state(&self) -> ClientState {
        self.lock().state
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().queue.len()
    }
}
