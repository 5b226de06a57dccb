use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::portfolio::snapshot::PortfolioSnapshot;

/// Look-back window for the snapshot history of a performance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PerformancePeriod {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    #[default]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "ALL")]
    All,
}

impl PerformancePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::YearToDate => "YTD",
            Self::All => "ALL",
        }
    }

    /// First instant inside the window ending at `now`. `None` means unbounded.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months_back = |n: u32| now.checked_sub_months(Months::new(n));
        match self {
            Self::OneDay => Some(now - Duration::days(1)),
            Self::OneWeek => Some(now - Duration::weeks(1)),
            Self::OneMonth => months_back(1),
            Self::ThreeMonths => months_back(3),
            Self::SixMonths => months_back(6),
            Self::OneYear => months_back(12),
            Self::YearToDate => Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0).single(),
            Self::All => None,
        }
    }
}

impl fmt::Display for PerformancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformancePeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(Self::OneDay),
            "1W" => Ok(Self::OneWeek),
            "1M" => Ok(Self::OneMonth),
            "3M" => Ok(Self::ThreeMonths),
            "6M" => Ok(Self::SixMonths),
            "1Y" => Ok(Self::OneYear),
            "YTD" => Ok(Self::YearToDate),
            "ALL" => Ok(Self::All),
            other => {
                Err(ValidationError::InvalidInput(format!("unknown period '{}'", other)).into())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingReturn {
    pub symbol: String,
    pub name: String,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub return_amount: Decimal,
    pub return_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
    pub price_is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub user_id: String,
    pub period: PerformancePeriod,
    pub current_value: Decimal,
    pub total_cost: Decimal,
    pub total_return: Decimal,
    pub total_return_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
    pub best_performer: Option<HoldingReturn>,
    pub worst_performer: Option<HoldingReturn>,
    pub holdings: Vec<HoldingReturn>,
    /// Snapshots inside the period, oldest first, including the one taken by this query
    pub history: Vec<PortfolioSnapshot>,
    /// Current value minus the oldest snapshot value in the period
    pub period_change: Decimal,
    pub period_change_percent: Decimal,
    pub warnings: Vec<String>,
    pub as_of: DateTime<Utc>,
}
