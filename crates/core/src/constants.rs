/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Sector assigned when the provider profile has none
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Asset type assigned when the provider profile has none
pub const DEFAULT_ASSET_TYPE: &str = "Stock";

/// Channel name for per-user portfolio change events
pub const PORTFOLIO_CHANNEL: &str = "portfolio";

/// Channel name for every price update regardless of symbol
pub const PRICES_CHANNEL: &str = "prices";

/// Number of times a trade is re-read and re-committed after losing a version race
pub const MAX_CONFLICT_RETRIES: usize = 1;
