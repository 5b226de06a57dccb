//! Helpers for the SQLite text encodings and parameter limits.
//!
//! Decimals are stored as their canonical string so no precision is lost.
//! Timestamps are stored as RFC 3339 UTC with fixed nanosecond precision so
//! lexicographic order matches chronological order.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::errors::StorageError;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite has a compile-time limit on the number of parameters in a SQL statement,
/// typically around 999 (SQLITE_MAX_VARIABLE_NUMBER). 500 leaves room for the
/// other parameters of the query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn parse_decimal(value: &str, field: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| {
            StorageError::Corrupt(format!("{} '{}' is not a decimal: {}", field, value, e))
        })
}

pub fn timestamp_to_text(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::Corrupt(format!("{} '{}' is not a timestamp: {}", field, value, e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_chunk_for_sqlite_over_limit() {
        let items: Vec<i32> = (0..1200).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn test_decimal_text_keeps_precision() {
        let value = dec!(153.33333333333333333333333333);
        assert_eq!(parse_decimal(&decimal_to_text(value), "price").unwrap(), value);
        assert_eq!(decimal_to_text(dec!(150.00)), "150");
        assert!(matches!(
            parse_decimal("abc", "price"),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn test_timestamp_text_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let (a, b) = (timestamp_to_text(earlier), timestamp_to_text(later));
        assert!(a < b);
        assert_eq!(parse_timestamp(&a, "taken_at").unwrap(), earlier);
    }
}
