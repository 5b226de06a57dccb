//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while talking to a quote provider.
///
/// The engine never retries inside a request. [`is_transient`](Self::is_transient)
/// tells background pollers whether the next tick is worth attempting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider rate limited the request.
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request did not complete within the configured bound.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The provider returned data that failed validation checks.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// The provider does not implement the requested operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported { operation: String, provider: String },
}

impl MarketDataError {
    /// Returns true when the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::ProviderError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_is_terminal() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = MarketDataError::Timeout {
            provider: "STATIC".to_string(),
        };
        assert!(error.is_transient());
        assert_eq!(error.to_string(), "Timeout: STATIC");
    }

    #[test]
    fn test_not_supported_is_terminal() {
        let error = MarketDataError::NotSupported {
            operation: "profile".to_string(),
            provider: "STATIC".to_string(),
        };
        assert!(!error.is_transient());
    }
}
