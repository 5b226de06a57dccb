use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest market quote for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Absolute change since the previous close
    pub change: Decimal,

    /// Change since the previous close, in percent
    pub change_percent: Decimal,

    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
    pub previous_close: Decimal,

    /// Time the provider stamped on the quote
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Builds a quote from a price and the previous close, deriving the change fields.
    ///
    /// Open, high and low collapse to the current price.
    pub fn from_price(
        symbol: impl Into<String>,
        price: Decimal,
        previous_close: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let change = price - previous_close;
        let change_percent = if previous_close.is_zero() {
            Decimal::ZERO
        } else {
            (change / previous_close * Decimal::ONE_HUNDRED).round_dp(4)
        };

        Self {
            symbol: symbol.into(),
            price,
            change,
            change_percent,
            high: price.max(previous_close),
            low: price.min(previous_close),
            open: previous_close,
            previous_close,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_price_derives_change() {
        let quote = Quote::from_price("AAPL", dec!(110), dec!(100), Utc::now());
        assert_eq!(quote.change, dec!(10));
        assert_eq!(quote.change_percent, dec!(10));
        assert_eq!(quote.high, dec!(110));
        assert_eq!(quote.low, dec!(100));
    }

    #[test]
    fn test_from_price_zero_previous_close() {
        let quote = Quote::from_price("NEW", dec!(5), Decimal::ZERO, Utc::now());
        assert_eq!(quote.change_percent, Decimal::ZERO);
    }
}
