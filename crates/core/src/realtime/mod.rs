//! Realtime hub: per-client mailboxes, channel subscriptions and fan-out.

mod channel;
mod client;
mod event;
mod hub;
mod mailbox;
mod price_feed;
mod sink;


pub use channel::Channel;
pub use client::ClientConnection;
pub use event::{ClientId, HubEvent};
pub use hub::{spawn_hub, HubHandle, HubStats};
pub use mailbox::ClientState;
pub use price_feed::PriceFeed;
pub use sink::HubEventSink;
