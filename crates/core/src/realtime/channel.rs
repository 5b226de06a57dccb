use std::fmt;
use std::str::FromStr;

use crate::constants::{PORTFOLIO_CHANNEL, PRICES_CHANNEL};
use crate::errors::{Error, Result, ValidationError};

/// Subscription target of a realtime client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Ledger changes of the client's own user
    Portfolio,
    /// Every price update
    Prices,
    /// Price updates of one symbol, upper-cased
    Symbol(String),
}

impl Channel {
    pub fn symbol(symbol: &str) -> Self {
        Channel::Symbol(symbol.trim().to_uppercase())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Portfolio => f.write_str(PORTFOLIO_CHANNEL),
            Channel::Prices => f.write_str(PRICES_CHANNEL),
            Channel::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("channel".to_string()).into());
        }
        if name.eq_ignore_ascii_case(PORTFOLIO_CHANNEL) {
            Ok(Channel::Portfolio)
        } else if name.eq_ignore_ascii_case(PRICES_CHANNEL) {
            Ok(Channel::Prices)
        } else {
            Ok(Channel::symbol(name))
        }
    }
}
