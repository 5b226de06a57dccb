//! Quote provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{CompanyProfile, Quote};

/// A source of live quotes and company profiles.
///
/// Calls are fallible and may be slow. The engine bounds each call with its
/// own timeout and never expects a provider to retry.
///
/// ```ignore
/// struct FixedPrice(Decimal);
///
/// #[async_trait]
/// impl QuoteProvider for FixedPrice {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
///         Ok(Quote::from_price(symbol, self.0, self.0, Utc::now()))
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short provider name for logs and error messages.
    fn id(&self) -> &'static str;

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Name, sector and asset type for `symbol`. Providers without profile
    /// data keep the default, which reports `NotSupported`.
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        let _ = symbol;
        Err(MarketDataError::NotSupported {
            operation: "profile".to_string(),
            provider: self.id().to_string(),
        })
    }
}
