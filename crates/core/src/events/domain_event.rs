//! Domain event types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{TradeOutcome, TradeType};

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about ledger changes. Runtime adapters
/// translate them into realtime pushes, cache invalidation, etc.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A trade was recorded and the holding updated in the same unit.
    TradeApplied {
        user_id: String,
        symbol: String,
        trade_type: TradeType,
        transaction_id: String,
        quantity: Decimal,
        price: Decimal,
        /// Quantity held after the trade; zero when the position was closed
        holding_quantity: Decimal,
        /// None when the position was closed
        average_cost: Option<Decimal>,
    },

    /// New symbols were added to the catalog.
    AssetsCreated { symbols: Vec<String> },

    /// A transaction row was corrected in place. Holdings were not re-derived.
    TransactionCorrected {
        user_id: String,
        symbol: String,
        transaction_id: String,
    },

    /// A transaction row was removed. Holdings were not re-derived.
    TransactionDeleted {
        user_id: String,
        symbol: String,
        transaction_id: String,
    },
}

impl DomainEvent {
    /// Creates a TradeApplied event from a committed trade.
    pub fn trade_applied(outcome: &TradeOutcome) -> Self {
        let tx = &outcome.transaction;
        Self::TradeApplied {
            user_id: tx.user_id.clone(),
            symbol: tx.symbol.clone(),
            trade_type: tx.trade_type,
            transaction_id: tx.id.clone(),
            quantity: tx.quantity,
            price: tx.price,
            holding_quantity: outcome
                .holding
                .as_ref()
                .map(|h| h.quantity)
                .unwrap_or(Decimal::ZERO),
            average_cost: outcome.holding.as_ref().map(|h| h.average_cost),
        }
    }

    /// Creates an AssetsCreated event.
    pub fn assets_created(symbols: Vec<String>) -> Self {
        Self::AssetsCreated { symbols }
    }

    pub fn transaction_corrected(user_id: String, symbol: String, transaction_id: String) -> Self {
        Self::TransactionCorrected {
            user_id,
            symbol,
            transaction_id,
        }
    }

    pub fn transaction_deleted(user_id: String, symbol: String, transaction_id: String) -> Self {
        Self::TransactionDeleted {
            user_id,
            symbol,
            transaction_id,
        }
    }

    /// Owner of the affected ledger, if the event is user scoped.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::TradeApplied { user_id, .. }
            | Self::TransactionCorrected { user_id, .. }
            | Self::TransactionDeleted { user_id, .. } => Some(user_id),
            Self::AssetsCreated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_domain_event_serialization() {
        let event = DomainEvent::TradeApplied {
            user_id: "u1".to_string(),
            symbol: "AAPL".to_string(),
            trade_type: TradeType::Buy,
            transaction_id: "tx1".to_string(),
            quantity: dec!(10),
            price: dec!(150),
            holding_quantity: dec!(10),
            average_cost: Some(dec!(150)),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"trade_applied\""));
        assert!(json.contains("\"trade_type\":\"BUY\""));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
        assert_eq!(deserialized.user_id(), Some("u1"));
    }

    #[test]
    fn test_assets_created_has_no_user() {
        let event = DomainEvent::assets_created(vec!["MSFT".to_string()]);
        assert_eq!(event.user_id(), None);
    }
}
