//! SQLite storage for portfolio analytics.

pub mod snapshot;
