//! Concentration and heuristic risk figures.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use super::risk_model::{PositionWeight, RiskAssessment, RiskLevel, SectorExposure};
use crate::assets::Asset;
use crate::config::{RiskModelConfig, SymbolTables};
use crate::constants::UNKNOWN_SECTOR;
use crate::ledger::Holding;
use crate::utils::decimal_utils::{percentage_of, ratio_of};

/// HHI above which a portfolio counts as highly concentrated.
pub const HIGH_CONCENTRATION_HHI: Decimal = dec!(0.25);
/// HHI above which a portfolio counts as moderately concentrated.
pub const MEDIUM_CONCENTRATION_HHI: Decimal = dec!(0.15);

const LARGE_POSITION_PERCENT: Decimal = dec!(25);
const HIGH_BETA: Decimal = dec!(1.2);
const MIN_DIVERSIFIED_HOLDINGS: usize = 5;

fn sector_of<'a>(holding: &Holding, assets: &'a HashMap<String, Asset>) -> &'a str {
    assets
        .get(&holding.symbol)
        .map(|a| a.sector.as_str())
        .unwrap_or(UNKNOWN_SECTOR)
}

/// Cost-basis value per sector, largest first.
pub fn sector_exposure(
    holdings: &[Holding],
    assets: &HashMap<String, Asset>,
) -> Vec<SectorExposure> {
    let mut by_sector: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for holding in holdings {
        let entry = by_sector.entry(sector_of(holding, assets)).or_default();
        entry.0 += holding.cost_basis();
        entry.1 += 1;
    }

    let total: Decimal = by_sector.values().map(|(v, _)| *v).sum();
    let mut exposure: Vec<SectorExposure> = by_sector
        .into_iter()
        .map(|(sector, (value, holding_count))| SectorExposure {
            sector: sector.to_string(),
            value,
            percentage: percentage_of(value, total),
            holding_count,
        })
        .collect();
    // Stable sort keeps sector names ascending among equal values.
    exposure.sort_by(|a, b| b.value.cmp(&a.value));
    exposure
}

/// Herfindahl-Hirschman index over sector weights: 1.0 for one sector, towards 0 as it spreads.
pub fn herfindahl_index(exposure: &[SectorExposure]) -> Decimal {
    let total: Decimal = exposure.iter().map(|e| e.value).sum();
    exposure
        .iter()
        .map(|e| {
            let weight = ratio_of(e.value, total);
            weight * weight
        })
        .sum::<Decimal>()
        .round_dp(4)
}

pub fn concentration_level(hhi: Decimal) -> RiskLevel {
    if hhi > HIGH_CONCENTRATION_HHI {
        RiskLevel::High
    } else if hhi > MEDIUM_CONCENTRATION_HHI {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Cost-weighted average of a per-symbol figure.
fn cost_weighted<F>(holdings: &[Holding], total: Decimal, figure: F) -> Decimal
where
    F: Fn(&str) -> Decimal,
{
    holdings
        .iter()
        .map(|h| ratio_of(h.cost_basis(), total) * figure(&h.symbol))
        .sum()
}

pub fn portfolio_beta(holdings: &[Holding], tables: &SymbolTables) -> Decimal {
    let total: Decimal = holdings.iter().map(Holding::cost_basis).sum();
    if total.is_zero() {
        return Decimal::ZERO;
    }
    cost_weighted(holdings, total, |s| tables.beta(s)).round_dp(4)
}

pub fn expected_return(holdings: &[Holding], tables: &SymbolTables) -> Decimal {
    let total: Decimal = holdings.iter().map(Holding::cost_basis).sum();
    if total.is_zero() {
        return Decimal::ZERO;
    }
    cost_weighted(holdings, total, |s| tables.outlook(s).expected_return).round_dp(4)
}

pub fn expected_volatility(beta: Decimal, hhi: Decimal, config: &RiskModelConfig) -> Decimal {
    (config.base_volatility * beta + config.concentration_weight * hhi).round_dp(4)
}

pub fn sharpe_ratio(
    expected_return: Decimal,
    volatility: Decimal,
    config: &RiskModelConfig,
) -> Decimal {
    if volatility.is_zero() {
        return Decimal::ZERO;
    }
    ((expected_return - config.risk_free_rate) / volatility).round_dp(4)
}

pub fn max_drawdown_estimate(volatility: Decimal, config: &RiskModelConfig) -> Decimal {
    (volatility * config.drawdown_multiplier * Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED)
        .round_dp(2)
}

/// One-day parametric VaR scaled down from annual volatility.
pub fn value_at_risk_95(
    total_value: Decimal,
    volatility: Decimal,
    config: &RiskModelConfig,
) -> Decimal {
    match Decimal::from(config.trading_days).sqrt() {
        Some(root) if !root.is_zero() => {
            (total_value * volatility * config.var_z_score / root).round_dp(2)
        }
        _ => Decimal::ZERO,
    }
}

fn largest_position(holdings: &[Holding], total: Decimal) -> Option<PositionWeight> {
    holdings
        .iter()
        .fold(None::<&Holding>, |best, h| match best {
            Some(b) if b.cost_basis() >= h.cost_basis() => Some(b),
            _ => Some(h),
        })
        .map(|h| PositionWeight {
            symbol: h.symbol.clone(),
            value: h.cost_basis(),
            percentage: percentage_of(h.cost_basis(), total),
        })
}

fn recommendations(assessment: &RiskAssessment) -> Vec<String> {
    if assessment.holding_count == 0 {
        return vec!["Portfolio is empty; add positions to assess risk".to_string()];
    }

    let mut notes = Vec::new();
    if assessment.concentration_level == RiskLevel::High {
        if let Some(top) = assessment.sector_exposure.first() {
            notes.push(format!(
                "Portfolio is highly concentrated in {} ({}%); \
                 consider diversifying across sectors",
                top.sector, top.percentage
            ));
        }
    } else if assessment.concentration_level == RiskLevel::Medium {
        notes.push("Sector concentration is moderate; watch for further overweighting".to_string());
    }
    if let Some(largest) = &assessment.largest_position {
        if largest.percentage > LARGE_POSITION_PERCENT && assessment.holding_count > 1 {
            notes.push(format!(
                "{} is {}% of the portfolio; consider trimming the position",
                largest.symbol, largest.percentage
            ));
        }
    }
    if assessment.holding_count < MIN_DIVERSIFIED_HOLDINGS {
        notes.push(format!(
            "Only {} holding(s); fewer than {} positions leaves the portfolio \
             exposed to single-name risk",
            assessment.holding_count, MIN_DIVERSIFIED_HOLDINGS
        ));
    }
    if assessment.portfolio_beta > HIGH_BETA {
        notes.push(format!(
            "Portfolio beta of {} implies above-market swings",
            assessment.portfolio_beta
        ));
    }
    notes
}

/// Full risk profile of a set of holdings.
pub fn assess(
    user_id: &str,
    holdings: &[Holding],
    assets: &HashMap<String, Asset>,
    config: &RiskModelConfig,
    tables: &SymbolTables,
) -> RiskAssessment {
    let total_value: Decimal = holdings.iter().map(Holding::cost_basis).sum();
    let sector_exposure = sector_exposure(holdings, assets);
    let hhi = herfindahl_index(&sector_exposure);

    let (beta, volatility, expected) = if total_value.is_zero() {
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    } else {
        let beta = portfolio_beta(holdings, tables);
        (beta, expected_volatility(beta, hhi, config), expected_return(holdings, tables))
    };

    let mut assessment = RiskAssessment {
        user_id: user_id.to_string(),
        total_value,
        holding_count: holdings.len(),
        sector_exposure,
        herfindahl_index: hhi,
        concentration_level: concentration_level(hhi),
        diversification_score: if holdings.is_empty() {
            Decimal::ZERO
        } else {
            ((Decimal::ONE - hhi) * Decimal::ONE_HUNDRED).round_dp(2)
        },
        portfolio_beta: beta,
        expected_volatility: volatility,
        expected_return: expected,
        sharpe_ratio: sharpe_ratio(expected, volatility, config),
        max_drawdown_estimate: max_drawdown_estimate(volatility, config),
        value_at_risk_95: value_at_risk_95(total_value, volatility, config),
        largest_position: largest_position(holdings, total_value),
        recommendations: Vec::new(),
        as_of: Utc::now(),
    };
    assessment.recommendations = recommendations(&assessment);
    assessment
}
