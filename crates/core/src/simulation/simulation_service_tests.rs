use std::sync::Arc;
use std::time::Duration;

use ledgerfolio_market_data::{CompanyProfile, StaticQuoteProvider};
use rust_decimal_macros::dec;

use super::{DiversificationImpact, SimulationService, SimulationServiceTrait, WhatIfRequest};
use crate::assets::{AssetRepositoryTrait, AssetService};
use crate::config::EngineConfig;
use crate::errors::{Error, ErrorKind, SimulationError};
use crate::events::NoOpDomainEventSink;
use crate::ledger::{LedgerService, LedgerServiceTrait, NewTrade};
use crate::memory::InMemoryStore;
use crate::quotes::QuoteClient;
use crate::users::{NewUser, UserRepositoryTrait};

struct Fixture {
    store: Arc<InMemoryStore>,
    provider: Arc<StaticQuoteProvider>,
    ledger: LedgerService,
    simulator: SimulationService,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(StaticQuoteProvider::new());
    let client = QuoteClient::new(provider.clone(), Duration::from_millis(200));
    let sink = Arc::new(NoOpDomainEventSink);
    let asset_service = Arc::new(AssetService::new(store.clone(), client.clone(), sink.clone()));

    UserRepositoryTrait::create(
        store.as_ref(),
        NewUser {
            id: Some("u1".to_string()),
            name: "Alice".to_string(),
        },
    )
    .await
    .unwrap();

    let ledger = LedgerService::new(store.clone(), store.clone(), asset_service.clone(), sink);
    let simulator = SimulationService::new(
        store.clone(),
        store.clone(),
        asset_service,
        client,
        Arc::new(EngineConfig::default()),
    );
    Fixture {
        store,
        provider,
        ledger,
        simulator,
    }
}

/// AAPL 10 @ 150 quoted at 170, MSFT 5 @ 300 quoted at 300.
async fn seeded() -> Fixture {
    let f = fixture().await;
    f.ledger
        .apply_trade(NewTrade::buy("u1", "AAPL", dec!(10), dec!(150)))
        .await
        .unwrap();
    f.ledger
        .apply_trade(NewTrade::buy("u1", "MSFT", dec!(5), dec!(300)))
        .await
        .unwrap();
    f.provider.set_price("AAPL", dec!(170));
    f.provider.set_price("MSFT", dec!(300));
    f
}

#[tokio::test]
async fn test_buy_new_symbol_projects_without_writing() {
    let f = seeded().await;
    let transactions_before = f.store.transaction_count();

    let result = f
        .simulator
        .simulate("u1", WhatIfRequest::buy("googl", dec!(5), dec!(140)))
        .await
        .unwrap();

    assert_eq!(result.request.symbol, "GOOGL");
    assert!(result.current_position.is_none());
    let projected = result.projected_position.unwrap();
    assert_eq!(projected.quantity, dec!(5));
    assert_eq!(projected.average_cost, dec!(140));

    assert_eq!(result.trade_value, dec!(700));
    assert_eq!(result.value_before, dec!(3200));
    assert_eq!(result.value_after, dec!(3900));
    assert_eq!(result.concentration_change_percent, dec!(17.95));
    assert_eq!(result.diversification_impact, DiversificationImpact::ModerateIncrease);
    assert_eq!(result.expected_annual_return, dec!(0.10));
    assert_eq!(result.expected_return_amount, dec!(70));
    assert_eq!(result.risk_adjusted_return, dec!(0.3571));
    assert!(result.warnings.is_empty());

    assert_eq!(f.store.transaction_count(), transactions_before);
    assert!(f.store.get_by_symbol("GOOGL").is_err());
    assert!(f.ledger.get_holding("u1", "GOOGL").unwrap().is_none());
}

#[tokio::test]
async fn test_buy_existing_reaverages() {
    let f = seeded().await;

    let result = f
        .simulator
        .simulate("u1", WhatIfRequest::buy("AAPL", dec!(5), dec!(180)))
        .await
        .unwrap();

    let current = result.current_position.unwrap();
    assert_eq!(current.quantity, dec!(10));
    let projected = result.projected_position.unwrap();
    assert_eq!(projected.quantity, dec!(15));
    assert_eq!(projected.average_cost, dec!(160));
    assert_eq!(projected.cost_basis, dec!(2400));
}

#[tokio::test]
async fn test_sell_reduces_and_labels_reduction() {
    let f = seeded().await;

    let result = f
        .simulator
        .simulate("u1", WhatIfRequest::sell("AAPL", dec!(4), dec!(170)))
        .await
        .unwrap();

    let projected = result.projected_position.unwrap();
    assert_eq!(projected.quantity, dec!(6));
    assert_eq!(projected.average_cost, dec!(150));
    assert_eq!(result.value_after, dec!(2520));
    // 680 / 2520
    assert_eq!(result.concentration_change_percent, dec!(26.98));
    assert_eq!(
        result.diversification_impact,
        DiversificationImpact::SignificantReduction
    );
    assert_eq!(result.expected_return_amount, dec!(-81.6));
}

#[tokio::test]
async fn test_full_sell_closes_position() {
    let f = seeded().await;

    let result = f
        .simulator
        .simulate("u1", WhatIfRequest::sell("MSFT", dec!(5), dec!(300)))
        .await
        .unwrap();

    assert!(result.projected_position.is_none());
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("closes the MSFT position")));
}

#[tokio::test]
async fn test_invalid_simulations_are_business_rule_errors() {
    let f = seeded().await;

    let oversell = f
        .simulator
        .simulate("u1", WhatIfRequest::sell("AAPL", dec!(11), dec!(170)))
        .await
        .unwrap_err();
    assert!(matches!(
        oversell,
        Error::Simulation(SimulationError::InvalidSimulation(_))
    ));
    assert_eq!(oversell.kind(), ErrorKind::BusinessRule);

    let nothing_held = f
        .simulator
        .simulate("u1", WhatIfRequest::sell("NVDA", dec!(1), dec!(100)))
        .await
        .unwrap_err();
    assert!(nothing_held.to_string().contains("no NVDA position"));

    let zero_price = f
        .simulator
        .simulate("u1", WhatIfRequest::buy("AAPL", dec!(1), dec!(0)))
        .await
        .unwrap_err();
    assert!(zero_price.is_business_rule());
}

#[tokio::test]
async fn test_overflowing_trade_value_is_rejected() {
    let f = seeded().await;
    let big = dec!(1_000_000_000_000_000);

    let err = f
        .simulator
        .simulate("u1", WhatIfRequest::buy("NEWCO", big, big))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Simulation(SimulationError::InvalidSimulation(ref msg)) if msg.contains("NEWCO")
    ));
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert!(f.store.get_by_symbol("NEWCO").is_err());
}

#[tokio::test]
async fn test_unknown_user() {
    let f = fixture().await;
    let err = f
        .simulator
        .simulate("ghost", WhatIfRequest::buy("AAPL", dec!(1), dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn test_allocation_shift_by_asset_type() {
    let f = fixture().await;
    f.provider
        .set_profile(CompanyProfile::new("SPY").with_name("SPDR S&P 500").with_asset_type("ETF"));
    f.ledger
        .apply_trade(NewTrade::buy("u1", "AAPL", dec!(10), dec!(150)))
        .await
        .unwrap();
    f.ledger
        .apply_trade(NewTrade::buy("u1", "SPY", dec!(2), dec!(500)))
        .await
        .unwrap();
    f.provider.set_price("AAPL", dec!(170));
    f.provider.set_price("SPY", dec!(500));

    let result = f
        .simulator
        .simulate("u1", WhatIfRequest::buy("SPY", dec!(3), dec!(500)))
        .await
        .unwrap();

    let etf = result
        .allocation_shift
        .iter()
        .find(|s| s.asset_type == "ETF")
        .unwrap();
    assert_eq!(etf.before_percent, dec!(37.04));
    assert_eq!(etf.after_percent, dec!(59.52));
    assert_eq!(etf.delta, dec!(22.48));

    let stock = result
        .allocation_shift
        .iter()
        .find(|s| s.asset_type == "Stock")
        .unwrap();
    assert_eq!(stock.delta, dec!(-22.48));
    assert_eq!(
        result.diversification_impact,
        DiversificationImpact::SignificantIncrease
    );
}

#[tokio::test]
async fn test_simulation_is_idempotent() {
    let f = seeded().await;
    let request = WhatIfRequest::buy("AAPL", dec!(2), dec!(175));

    let first = f.simulator.simulate("u1", request.clone()).await.unwrap();
    let second = f.simulator.simulate("u1", request).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_quote_surfaces_warning() {
    let f = seeded().await;
    f.provider.fail_symbol("MSFT");

    let result = f
        .simulator
        .simulate("u1", WhatIfRequest::buy("AAPL", dec!(1), dec!(170)))
        .await
        .unwrap();

    // MSFT falls back to its 300 average cost.
    assert_eq!(result.value_before, dec!(3200));
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("MSFT"));
}
