use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerfolio_market_data::Quote;

use crate::events::DomainEvent;

/// Identifier of one hub connection. Never reused.
pub type ClientId = Uuid;

/// Events pushed to realtime clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    /// Handshake acknowledgement, sent to the new client only.
    Connected { client_id: ClientId },

    /// A ledger change for `user_id`, delivered to that user's portfolio subscribers.
    PortfolioUpdate { user_id: String, event: DomainEvent },

    /// A new price, delivered to subscribers of the symbol and of `prices`.
    PriceUpdate { symbol: String, quote: Quote },
}

impl HubEvent {
    pub fn portfolio_update(user_id: impl Into<String>, event: DomainEvent) -> Self {
        HubEvent::PortfolioUpdate {
            user_id: user_id.into(),
            event,
        }
    }

    pub fn price_update(quote: Quote) -> Self {
        HubEvent::PriceUpdate {
            symbol: quote.symbol.to_uppercase(),
            quote,
        }
    }
}
