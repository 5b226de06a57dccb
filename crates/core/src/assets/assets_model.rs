//! Asset domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerfolio_market_data::CompanyProfile;

use crate::constants::{DEFAULT_ASSET_TYPE, UNKNOWN_SECTOR};

/// Catalog entry for a tradable symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub asset_type: String,
    pub sector: String,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Placeholder used by read paths for symbols missing from the catalog.
    pub fn unlisted(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            asset_type: DEFAULT_ASSET_TYPE.to_string(),
            sector: UNKNOWN_SECTOR.to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub symbol: String,
    pub name: String,
    pub asset_type: String,
    pub sector: String,
}

impl NewAsset {
    /// Catalog entry for a symbol the provider could not describe.
    pub fn bare(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            asset_type: DEFAULT_ASSET_TYPE.to_string(),
            sector: UNKNOWN_SECTOR.to_string(),
        }
    }

    /// Fills the catalog entry from a provider profile, defaulting blank fields.
    pub fn from_profile(symbol: &str, profile: CompanyProfile) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            symbol: symbol.to_string(),
            name: non_blank(profile.name).unwrap_or_else(|| symbol.to_string()),
            asset_type: non_blank(profile.asset_type)
                .unwrap_or_else(|| DEFAULT_ASSET_TYPE.to_string()),
            sector: non_blank(profile.sector).unwrap_or_else(|| UNKNOWN_SECTOR.to_string()),
        }
    }
}
