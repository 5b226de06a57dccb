//! Error taxonomy for the engine. Storage drivers convert their own errors
//! into [`DatabaseError`] before they reach this crate.

use rust_decimal::Decimal;
use thiserror::Error;

pub use ledgerfolio_market_data::MarketDataError;

pub type Result<T> = std::result::Result<T, Error>;

/// Root error type. Use [`Error::kind`] to decide how a caller should react.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger rule violated: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Simulation rejected: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Concurrent modification of holding {user_id}/{symbol}")]
    ConcurrencyConflict { user_id: String, symbol: String },

    #[error("Realtime hub unavailable: {0}")]
    Realtime(String),

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// How a failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request violates a domain rule. Never retried.
    BusinessRule,
    /// A referenced record does not exist.
    NotFound,
    /// The quote provider failed or timed out.
    Upstream,
    /// The ledger store failed.
    Store,
    /// A concurrent writer won the race on the same holding.
    Conflict,
    /// Anything else: configuration, hub shutdown, invariant violations.
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Ledger(_) | Error::Simulation(_) => {
                ErrorKind::BusinessRule
            }
            Error::UserNotFound(_) | Error::TransactionNotFound(_) => ErrorKind::NotFound,
            Error::Database(DatabaseError::NotFound(_)) => ErrorKind::NotFound,
            Error::MarketData(_) => ErrorKind::Upstream,
            Error::Database(_) => ErrorKind::Store,
            Error::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            Error::Realtime(_)
            | Error::ConfigIO(_)
            | Error::InvalidConfigValue(_)
            | Error::Unexpected(_) => ErrorKind::Internal,
        }
    }

    pub fn is_business_rule(&self) -> bool {
        self.kind() == ErrorKind::BusinessRule
    }
}

/// Store failures, reported as strings so this crate stays free of driver types.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Usually an unknown user or symbol reaching the ledger tables.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be decoded, or the writer task is gone.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Cost-basis rules enforced by the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient position in {symbol}: requested {requested}, available {available}")]
    InsufficientPosition {
        symbol: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Arithmetic overflow while updating position in {symbol}")]
    ArithmeticOverflow { symbol: String },
}

/// Rejections raised by the what-if simulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Invalid simulation: {0}")]
    InvalidSimulation(String),
}

/// Malformed trade, simulation or channel input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigIO(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_position_is_business_rule() {
        let err: Error = LedgerError::InsufficientPosition {
            symbol: "AAPL".to_string(),
            requested: dec!(5),
            available: dec!(2),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert!(err.to_string().contains("requested 5, available 2"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::Database(DatabaseError::QueryFailed("boom".into())).kind(),
            ErrorKind::Store
        );
        assert_eq!(
            Error::Database(DatabaseError::NotFound("tx".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::MarketData(MarketDataError::SymbolNotFound("X".into())).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            Error::ConcurrencyConflict {
                user_id: "u".into(),
                symbol: "AAPL".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(Error::UserNotFound("u".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Realtime("closed".into()).kind(),
            ErrorKind::Internal
        );
    }
}
