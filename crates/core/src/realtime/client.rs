use std::sync::Arc;

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::channel::Channel;
use super::event::{ClientId, HubEvent};
use super::hub::{HubCommand, HubHandle};
use super::mailbox::{ClientState, Mailbox};
use crate::errors::{Error, Result};

/// One realtime connection.
///
/// Dropping the connection unregisters it from the hub. A reconnect gets a new
/// id and starts with no subscriptions.
pub struct ClientConnection {
    id: ClientId,
    user_id: String,
    mailbox: Arc<Mailbox>,
    commands: mpsc::Sender<HubCommand>,
}

impl ClientConnection {
    pub(crate) fn new(
        id: ClientId,
        user_id: String,
        mailbox: Arc<Mailbox>,
        commands: mpsc::Sender<HubCommand>,
    ) -> Self {
        Self {
            id,
            user_id,
            mailbox,
            commands,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> ClientState {
        self.mailbox.state()
    }

    /// Events evicted because this client fell behind.
    pub fn dropped_events(&self) -> u64 {
        self.mailbox.dropped()
    }

    /// Next event. `None` once the client is disconnected.
    pub async fn recv(&self) -> Option<HubEvent> {
        self.mailbox.recv().await
    }

    pub fn try_recv(&self) -> Option<HubEvent> {
        self.mailbox.try_recv()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.state() == ClientState::Disconnected {
            return Err(Error::Realtime(format!("client {} is disconnected", self.id)));
        }
        Ok(())
    }

    pub async fn subscribe(&self, channel: Channel) -> Result<()> {
        self.ensure_connected()?;
        let client_id = self.id;
        let registered = HubHandle::request(&self.commands, |reply| HubCommand::Subscribe {
            client_id,
            channel,
            reply,
        })
        .await?;
        if !registered {
            return Err(Error::Realtime(format!("client {} is not registered", client_id)));
        }
        Ok(())
    }

    pub async fn unsubscribe(&self, channel: Channel) -> Result<()> {
        self.ensure_connected()?;
        let client_id = self.id;
        HubHandle::request(&self.commands, |reply| HubCommand::Unsubscribe {
            client_id,
            channel,
            reply,
        })
        .await?;
        Ok(())
    }

    /// Leaves every channel and discards queued events.
    pub async fn disconnect(self) -> Result<()> {
        let client_id = self.id;
        let result = HubHandle::request(&self.commands, |reply| HubCommand::Unregister {
            client_id,
            reply: Some(reply),
        })
        .await;
        self.mailbox.close();
        result
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        if self.mailbox.state() == ClientState::Disconnected {
            return;
        }
        self.mailbox.close();
        let command = HubCommand::Unregister {
            client_id: self.id,
            reply: None,
        };
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                // Finish the unregister off the dropping thread.
                if let Ok(runtime) = Handle::try_current() {
                    let commands = self.commands.clone();
                    runtime.spawn(async move {
                        let _ = commands.send(command).await;
                    });
                } else {
                    // The hub sweeps the closed mailbox on its next publish.
                    warn!("Hub queue full while dropping client {} outside a runtime", self.id);
                }
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Hub already stopped while dropping client {}", self.id);
            }
        }
    }
}
