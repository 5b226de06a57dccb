//! Subscription registry and fan-out, run as a single actor task.
//!
//! Every registry change and every broadcast is a command processed in order by
//! one loop, so a broadcast always sees the registry as of its own position in
//! the queue. Delivery is a non-blocking mailbox push.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::channel::Channel;
use super::client::ClientConnection;
use super::event::{ClientId, HubEvent};
use super::mailbox::{ClientState, Mailbox};
use crate::config::HubConfig;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub connected_clients: usize,
    /// Client/channel pairs across all channels
    pub subscriptions: usize,
    pub events_published: u64,
    pub events_delivered: u64,
    /// Events evicted from full client mailboxes
    pub events_dropped: u64,
}

pub(crate) enum HubCommand {
    Register {
        client_id: ClientId,
        user_id: String,
        mailbox: Arc<Mailbox>,
        reply: oneshot::Sender<()>,
    },
    Unregister {
        client_id: ClientId,
        reply: Option<oneshot::Sender<()>>,
    },
    Subscribe {
        client_id: ClientId,
        channel: Channel,
        reply: oneshot::Sender<bool>,
    },
    Unsubscribe {
        client_id: ClientId,
        channel: Channel,
        reply: oneshot::Sender<bool>,
    },
    Publish {
        event: HubEvent,
        reply: Option<oneshot::Sender<usize>>,
    },
    SubscribedSymbols {
        reply: oneshot::Sender<Vec<String>>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct ClientEntry {
    user_id: String,
    mailbox: Arc<Mailbox>,
    channels: BTreeSet<Channel>,
}

#[derive(Default)]
struct Registry {
    clients: HashMap<ClientId, ClientEntry>,
    subscribers: HashMap<Channel, BTreeSet<ClientId>>,
    stats: HubStats,
}

impl Registry {
    fn register(&mut self, client_id: ClientId, user_id: String, mailbox: Arc<Mailbox>) {
        mailbox.push(HubEvent::Connected { client_id });
        mailbox.mark_connected();
        debug!("Realtime client {} connected for user {}", client_id, user_id);
        self.clients.insert(
            client_id,
            ClientEntry {
                user_id,
                mailbox,
                channels: BTreeSet::new(),
            },
        );
    }

    fn unregister(&mut self, client_id: &ClientId) {
        let Some(entry) = self.clients.remove(client_id) else {
            return;
        };
        for channel in &entry.channels {
            self.remove_subscriber(channel, client_id);
        }
        entry.mailbox.close();
        debug!("Realtime client {} disconnected", client_id);
    }

    fn subscribe(&mut self, client_id: ClientId, channel: Channel) -> bool {
        let Some(entry) = self.clients.get_mut(&client_id) else {
            return false;
        };
        entry.channels.insert(channel.clone());
        self.subscribers.entry(channel).or_default().insert(client_id);
        true
    }

    fn unsubscribe(&mut self, client_id: ClientId, channel: &Channel) -> bool {
        let Some(entry) = self.clients.get_mut(&client_id) else {
            return false;
        };
        entry.channels.remove(channel);
        self.remove_subscriber(channel, &client_id);
        true
    }

    fn remove_subscriber(&mut self, channel: &Channel, client_id: &ClientId) {
        if let Some(set) = self.subscribers.get_mut(channel) {
            set.remove(client_id);
            if set.is_empty() {
                self.subscribers.remove(channel);
            }
        }
    }

    fn subscribers_of(&self, channel: &Channel) -> impl Iterator<Item = &ClientId> {
        self.subscribers.get(channel).into_iter().flatten()
    }

    fn recipients(&self, event: &HubEvent) -> BTreeSet<ClientId> {
        match event {
            HubEvent::Connected { .. } => BTreeSet::new(),
            HubEvent::PortfolioUpdate { user_id, .. } => self
                .subscribers_of(&Channel::Portfolio)
                .filter(|id| {
                    self.clients
                        .get(*id)
                        .is_some_and(|entry| &entry.user_id == user_id)
                })
                .copied()
                .collect(),
            HubEvent::PriceUpdate { symbol, .. } => self
                .subscribers_of(&Channel::symbol(symbol))
                .chain(self.subscribers_of(&Channel::Prices))
                .copied()
                .collect(),
        }
    }

    fn publish(&mut self, event: HubEvent) -> usize {
        if matches!(event, HubEvent::Connected { .. }) {
            warn!("Ignoring attempt to broadcast a connection acknowledgement");
            return 0;
        }

        let recipients = self.recipients(&event);
        self.stats.events_published += 1;
        let mut delivered = 0;
        let mut stale = Vec::new();
        for client_id in &recipients {
            let Some(entry) = self.clients.get(client_id) else {
                continue;
            };
            // A handle dropped without reaching the actor leaves a closed mailbox behind.
            if entry.mailbox.state() == ClientState::Disconnected {
                stale.push(*client_id);
                continue;
            }
            if !entry.mailbox.push(event.clone()) {
                self.stats.events_dropped += 1;
                debug!("Mailbox of client {} is full, dropped oldest event", client_id);
            }
            self.stats.events_delivered += 1;
            delivered += 1;
        }
        for client_id in &stale {
            self.unregister(client_id);
        }
        delivered
    }

    fn subscribed_symbols(&self) -> Vec<String> {
        self.subscribers
            .keys()
            .filter_map(|channel| match channel {
                Channel::Symbol(symbol) => Some(symbol.clone()),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn stats(&self) -> HubStats {
        HubStats {
            connected_clients: self.clients.len(),
            subscriptions: self.subscribers.values().map(BTreeSet::len).sum(),
            ..self.stats
        }
    }

    fn close_all(&mut self) {
        for (_, entry) in self.clients.drain() {
            entry.mailbox.close();
        }
        self.subscribers.clear();
    }
}

async fn run(mut commands: mpsc::Receiver<HubCommand>) {
    let mut registry = Registry::default();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register {
                client_id,
                user_id,
                mailbox,
                reply,
            } => {
                registry.register(client_id, user_id, mailbox);
                let _ = reply.send(());
            }
            HubCommand::Unregister { client_id, reply } => {
                registry.unregister(&client_id);
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            HubCommand::Subscribe {
                client_id,
                channel,
                reply,
            } => {
                let _ = reply.send(registry.subscribe(client_id, channel));
            }
            HubCommand::Unsubscribe {
                client_id,
                channel,
                reply,
            } => {
                let _ = reply.send(registry.unsubscribe(client_id, &channel));
            }
            HubCommand::Publish { event, reply } => {
                let delivered = registry.publish(event);
                if let Some(reply) = reply {
                    let _ = reply.send(delivered);
                }
            }
            HubCommand::SubscribedSymbols { reply } => {
                let _ = reply.send(registry.subscribed_symbols());
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(registry.stats());
            }
            HubCommand::Shutdown { reply } => {
                registry.close_all();
                let _ = reply.send(());
                break;
            }
        }
    }

    registry.close_all();
    info!("Realtime hub stopped");
}

fn hub_closed() -> Error {
    Error::Realtime("hub is shut down".to_string())
}

/// Cloneable handle to the hub actor.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
    client_buffer: usize,
}

impl HubHandle {
    pub(crate) async fn request<T>(
        commands: &mpsc::Sender<HubCommand>,
        command: impl FnOnce(oneshot::Sender<T>) -> HubCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        commands
            .send(command(reply))
            .await
            .map_err(|_| hub_closed())?;
        response.await.map_err(|_| hub_closed())
    }

    /// Opens a new client for `user_id`. The client's first event is `connected`.
    pub async fn connect(&self, user_id: &str) -> Result<ClientConnection> {
        let client_id = Uuid::new_v4();
        let mailbox = Arc::new(Mailbox::new(self.client_buffer));
        let user_id = user_id.to_string();
        Self::request(&self.commands, |reply| HubCommand::Register {
            client_id,
            user_id: user_id.clone(),
            mailbox: mailbox.clone(),
            reply,
        })
        .await?;
        Ok(ClientConnection::new(
            client_id,
            user_id,
            mailbox,
            self.commands.clone(),
        ))
    }

    /// Broadcasts `event` and returns the number of recipients.
    pub async fn publish(&self, event: HubEvent) -> Result<usize> {
        Self::request(&self.commands, |reply| HubCommand::Publish {
            event,
            reply: Some(reply),
        })
        .await
    }

    /// Queues `event` for broadcast without waiting. Fails when the command queue is full.
    pub fn try_publish(&self, event: HubEvent) -> Result<()> {
        self.commands
            .try_send(HubCommand::Publish { event, reply: None })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::Realtime("hub command queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => hub_closed(),
            })
    }

    /// Symbols with at least one direct subscriber, sorted.
    pub async fn subscribed_symbols(&self) -> Result<Vec<String>> {
        Self::request(&self.commands, |reply| HubCommand::SubscribedSymbols { reply }).await
    }

    pub async fn stats(&self) -> Result<HubStats> {
        Self::request(&self.commands, |reply| HubCommand::Stats { reply }).await
    }

    /// Disconnects every client and stops the actor. Later calls fail with `Realtime`.
    pub async fn shutdown(&self) -> Result<()> {
        Self::request(&self.commands, |reply| HubCommand::Shutdown { reply }).await
    }
}

/// Spawns the hub actor on the current Tokio runtime.
pub fn spawn_hub(config: &HubConfig) -> HubHandle {
    let (commands, receiver) = mpsc::channel(config.command_buffer.max(1));
    tokio::spawn(run(receiver));
    HubHandle {
        commands,
        client_buffer: config.client_buffer,
    }
}
