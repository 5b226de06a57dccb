//! The portfolio engine running on the SQLite repositories.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use ledgerfolio_core::errors::{Error, LedgerError};
use ledgerfolio_core::ledger::{NewTrade, TradeType, TransactionFilter};
use ledgerfolio_core::portfolio::performance::PerformancePeriod;
use ledgerfolio_core::users::NewUser;
use ledgerfolio_core::{EngineConfig, PortfolioEngine};
use ledgerfolio_market_data::StaticQuoteProvider;
use ledgerfolio_storage_sqlite::{create_pool, repositories, run_migrations, spawn_writer};

fn sqlite_engine(provider: Arc<StaticQuoteProvider>) -> (Arc<PortfolioEngine>, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("engine.db");
    let pool = create_pool(&path.to_string_lossy()).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone()).expect("Failed to start writer");

    let engine = PortfolioEngine::new(EngineConfig::default(), repositories(pool, writer), provider)
        .expect("Failed to build engine");
    (Arc::new(engine), dir)
}

#[tokio::test]
async fn test_ledger_lifecycle_persists() {
    let provider = Arc::new(StaticQuoteProvider::new());
    provider.set_price("AAPL", dec!(200));
    let (engine, _dir) = sqlite_engine(provider);
    let user = engine.create_user(NewUser::new("Alice")).await.unwrap();

    engine
        .apply_trade(NewTrade::buy(&user.id, "AAPL", dec!(10), dec!(150)))
        .await
        .unwrap();
    let outcome = engine
        .apply_trade(NewTrade::buy(&user.id, "AAPL", dec!(5), dec!(180)))
        .await
        .unwrap();
    let holding = outcome.holding.unwrap();
    assert_eq!(holding.quantity, dec!(15));
    assert_eq!(holding.average_cost, dec!(160));

    let summary = engine.get_portfolio_summary(&user.id).await.unwrap();
    assert_eq!(summary.total_value, dec!(3000));
    assert_eq!(summary.unrealized_pnl, dec!(600));

    engine
        .apply_trade(NewTrade::sell(&user.id, "AAPL", dec!(15), dec!(200)))
        .await
        .unwrap();
    assert!(engine.get_holdings(&user.id).unwrap().is_empty());

    let err = engine
        .apply_trade(NewTrade::sell(&user.id, "AAPL", dec!(1), dec!(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::InsufficientPosition { .. })));

    let history = engine
        .get_transactions(&user.id, &TransactionFilter::default())
        .unwrap();
    assert_eq!(history.len(), 3);

    let performance = engine
        .get_performance_analytics(&user.id, PerformancePeriod::All)
        .await
        .unwrap();
    assert_eq!(performance.history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_trades_keep_holding_consistent() {
    let (engine, _dir) = sqlite_engine(Arc::new(StaticQuoteProvider::new()));
    let user = engine.create_user(NewUser::new("Bob")).await.unwrap();
    engine
        .apply_trade(NewTrade::buy(&user.id, "MSFT", dec!(10), dec!(300)))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let engine = engine.clone();
        let user_id = user.id.clone();
        tasks.push(tokio::spawn(async move {
            let trade = if i % 2 == 0 {
                NewTrade::buy(user_id, "MSFT", dec!(2), dec!(310))
            } else {
                NewTrade::sell(user_id, "MSFT", dec!(1), dec!(320))
            };
            engine.apply_trade(trade).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // 10 + 5 * 2 - 5 * 1
    let holding = engine
        .ledger()
        .get_holding(&user.id, "MSFT")
        .unwrap()
        .unwrap();
    assert_eq!(holding.quantity, dec!(15));
    assert_eq!(holding.version, 11);
    assert!(holding.average_cost > dec!(300) && holding.average_cost < dec!(310));

    let transactions = engine
        .get_transactions(&user.id, &TransactionFilter::default())
        .unwrap();
    assert_eq!(transactions.len(), 11);
    let net: Decimal = transactions
        .iter()
        .map(|t| match t.trade_type {
            TradeType::Buy => t.quantity,
            TradeType::Sell => -t.quantity,
        })
        .sum();
    assert_eq!(net, holding.quantity);
}
