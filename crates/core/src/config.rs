//! Engine configuration.
//!
//! Every field has a default so an empty JSON object is a valid config file.
//! Environment variables override individual values after the file is read.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub const CONFIG_PATH_ENV: &str = "LEDGERFOLIO_CONFIG";
pub const QUOTE_TIMEOUT_ENV: &str = "LEDGERFOLIO_QUOTE_TIMEOUT_MS";
pub const TOP_HOLDINGS_ENV: &str = "LEDGERFOLIO_TOP_HOLDINGS";
pub const HUB_CLIENT_BUFFER_ENV: &str = "LEDGERFOLIO_HUB_CLIENT_BUFFER";
pub const PRICE_FEED_INTERVAL_ENV: &str = "LEDGERFOLIO_PRICE_FEED_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Upper bound on a single quote or profile call.
    pub quote_timeout_ms: u64,
    /// Number of holdings listed in the allocation top-N view.
    pub top_holdings: usize,
    /// Poll period of the background price feed.
    pub price_feed_interval_secs: u64,
    /// Symbols the price feed polls even when nobody subscribed to them.
    pub watchlist: Vec<String>,
    pub hub: HubConfig,
    pub risk: RiskModelConfig,
    pub symbols: SymbolTables,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quote_timeout_ms: 3_000,
            top_holdings: 10,
            price_feed_interval_secs: 15,
            watchlist: Vec::new(),
            hub: HubConfig::default(),
            risk: RiskModelConfig::default(),
            symbols: SymbolTables::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HubConfig {
    /// Events queued per client before the oldest is dropped.
    pub client_buffer: usize,
    /// Capacity of the hub command channel.
    pub command_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            client_buffer: 64,
            command_buffer: 1024,
        }
    }
}

/// Constants of the heuristic risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskModelConfig {
    pub base_volatility: Decimal,
    pub concentration_weight: Decimal,
    pub risk_free_rate: Decimal,
    pub drawdown_multiplier: Decimal,
    pub var_z_score: Decimal,
    pub trading_days: u32,
}

impl Default for RiskModelConfig {
    fn default() -> Self {
        Self {
            base_volatility: dec!(0.20),
            concentration_weight: dec!(0.10),
            risk_free_rate: dec!(0.02),
            drawdown_multiplier: dec!(2.0),
            var_z_score: dec!(1.645),
            trading_days: 252,
        }
    }
}

/// Annual expected return and volatility for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolOutlook {
    pub expected_return: Decimal,
    pub volatility: Decimal,
}

/// Per-symbol lookup tables used by the risk model and the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolTables {
    pub betas: HashMap<String, Decimal>,
    pub default_beta: Decimal,
    pub outlooks: HashMap<String, SymbolOutlook>,
    pub default_outlook: SymbolOutlook,
}

impl SymbolTables {
    pub fn beta(&self, symbol: &str) -> Decimal {
        self.betas
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.default_beta)
    }

    pub fn outlook(&self, symbol: &str) -> SymbolOutlook {
        self.outlooks
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.default_outlook)
    }
}

impl Default for SymbolTables {
    fn default() -> Self {
        let betas = [
            ("AAPL", dec!(1.2)),
            ("MSFT", dec!(0.9)),
            ("GOOGL", dec!(1.1)),
            ("AMZN", dec!(1.3)),
            ("TSLA", dec!(2.0)),
            ("NVDA", dec!(1.7)),
            ("META", dec!(1.3)),
            ("JPM", dec!(1.1)),
            ("JNJ", dec!(0.7)),
            ("SPY", dec!(1.0)),
        ]
        .into_iter()
        .map(|(s, b)| (s.to_string(), b))
        .collect();

        let outlooks = [
            ("AAPL", dec!(0.12), dec!(0.25)),
            ("MSFT", dec!(0.11), dec!(0.22)),
            ("GOOGL", dec!(0.10), dec!(0.28)),
            ("AMZN", dec!(0.13), dec!(0.32)),
            ("TSLA", dec!(0.15), dec!(0.55)),
            ("NVDA", dec!(0.18), dec!(0.45)),
            ("META", dec!(0.12), dec!(0.35)),
            ("SPY", dec!(0.08), dec!(0.16)),
        ]
        .into_iter()
        .map(|(s, r, v)| {
            (
                s.to_string(),
                SymbolOutlook {
                    expected_return: r,
                    volatility: v,
                },
            )
        })
        .collect();

        Self {
            betas,
            default_beta: Decimal::ONE,
            outlooks,
            default_outlook: SymbolOutlook {
                expected_return: dec!(0.08),
                volatility: dec!(0.25),
            },
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        info!("Loaded engine configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from `LEDGERFOLIO_CONFIG` plus individual overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        if let Some(v) = parse_override(&lookup, QUOTE_TIMEOUT_ENV)? {
            config.quote_timeout_ms = v;
        }
        if let Some(v) = parse_override(&lookup, TOP_HOLDINGS_ENV)? {
            config.top_holdings = v;
        }
        if let Some(v) = parse_override(&lookup, HUB_CLIENT_BUFFER_ENV)? {
            config.hub.client_buffer = v;
        }
        if let Some(v) = parse_override(&lookup, PRICE_FEED_INTERVAL_ENV)? {
            config.price_feed_interval_secs = v;
        }

        config.validate()?;
        debug!("Engine configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quote_timeout_ms == 0 {
            return Err(Error::InvalidConfigValue(
                "quoteTimeoutMs must be greater than zero".to_string(),
            ));
        }
        if self.price_feed_interval_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "priceFeedIntervalSecs must be greater than zero".to_string(),
            ));
        }
        if self.hub.client_buffer == 0 || self.hub.command_buffer == 0 {
            return Err(Error::InvalidConfigValue(
                "hub buffers must be greater than zero".to_string(),
            ));
        }
        if self.risk.trading_days == 0 {
            return Err(Error::InvalidConfigValue(
                "risk.tradingDays must be greater than zero".to_string(),
            ));
        }

        let risk = &self.risk;
        let constants = [
            ("risk.baseVolatility", risk.base_volatility),
            ("risk.concentrationWeight", risk.concentration_weight),
            ("risk.riskFreeRate", risk.risk_free_rate),
            ("risk.drawdownMultiplier", risk.drawdown_multiplier),
            ("risk.varZScore", risk.var_z_score),
        ];
        if let Some((name, _)) = constants.iter().find(|(_, v)| v.is_sign_negative()) {
            return Err(Error::InvalidConfigValue(format!(
                "{} must not be negative",
                name
            )));
        }
        Ok(())
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    pub fn price_feed_interval(&self) -> Duration {
        Duration::from_secs(self.price_feed_interval_secs)
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidConfigValue(format!("{}='{}'", key, raw))),
    }
}
