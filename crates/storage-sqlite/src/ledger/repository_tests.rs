use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use ledgerfolio_core::assets::{AssetRepositoryTrait, NewAsset};
use ledgerfolio_core::errors::{DatabaseError, Error};
use ledgerfolio_core::ledger::{
    Holding, HoldingChange, LedgerRepositoryTrait, TradeCommit, TradeType, Transaction,
    TransactionFilter,
};
use ledgerfolio_core::users::{NewUser, UserRepositoryTrait};

use super::LedgerRepository;
use crate::assets::AssetRepository;
use crate::test_utils::test_db;
use crate::users::UserRepository;

async fn seeded() -> (LedgerRepository, tempfile::TempDir) {
    let (pool, writer, dir) = test_db();
    let users = UserRepository::new(pool.clone(), writer.clone());
    for id in ["u1", "u2"] {
        users
            .create(NewUser {
                id: Some(id.to_string()),
                name: id.to_uppercase(),
            })
            .await
            .unwrap();
    }
    let assets = AssetRepository::new(pool.clone(), writer.clone());
    for symbol in ["AAPL", "MSFT"] {
        assets.create(NewAsset::bare(symbol)).await.unwrap();
    }
    (LedgerRepository::new(pool, writer), dir)
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 14, 30, 0).unwrap()
}

fn transaction(
    user_id: &str,
    symbol: &str,
    trade_type: TradeType,
    quantity: Decimal,
    price: Decimal,
    executed_at: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        symbol: symbol.to_string(),
        trade_type,
        quantity,
        price,
        fees: Decimal::ZERO,
        total_amount: quantity * price,
        notes: None,
        executed_at,
        created_at: executed_at,
    }
}

fn opening(user_id: &str, symbol: &str, quantity: Decimal, price: Decimal) -> TradeCommit {
    let tx = transaction(user_id, symbol, TradeType::Buy, quantity, price, at(1));
    TradeCommit {
        user_id: user_id.to_string(),
        symbol: symbol.to_string(),
        expected_version: None,
        holding_change: HoldingChange::Upsert(Holding {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            quantity,
            average_cost: price,
            version: 1,
            created_at: tx.executed_at,
            updated_at: tx.executed_at,
        }),
        transaction: tx,
    }
}

fn follow_up(current: &Holding, quantity: Decimal, average_cost: Decimal, day: u32) -> TradeCommit {
    TradeCommit {
        user_id: current.user_id.clone(),
        symbol: current.symbol.clone(),
        expected_version: Some(current.version),
        transaction: transaction(
            &current.user_id,
            &current.symbol,
            TradeType::Buy,
            dec!(1),
            average_cost,
            at(day),
        ),
        holding_change: HoldingChange::Upsert(Holding {
            quantity,
            average_cost,
            version: current.version + 1,
            updated_at: at(day),
            ..current.clone()
        }),
    }
}

#[tokio::test]
async fn test_commit_round_trips_exact_decimals() {
    let (repo, _dir) = seeded().await;
    let avg = dec!(153.33333333333333333333333333);
    let outcome = repo.commit_trade(opening("u1", "AAPL", dec!(15), avg)).await.unwrap();

    let stored = repo.get_holding("u1", "AAPL").unwrap().unwrap();
    assert_eq!(Some(stored.clone()), outcome.holding);
    assert_eq!(stored.average_cost, avg);
    assert_eq!(stored.version, 1);
    assert_eq!(repo.get_transaction(&outcome.transaction.id).unwrap(), outcome.transaction);
}

#[tokio::test]
async fn test_stale_version_is_rejected_and_rolled_back() {
    let (repo, _dir) = seeded().await;
    let first = repo.commit_trade(opening("u1", "AAPL", dec!(10), dec!(150))).await.unwrap();
    let holding = first.holding.unwrap();

    repo.commit_trade(follow_up(&holding, dec!(11), dec!(151), 2)).await.unwrap();
    // Computed from version 1, which is no longer current.
    let err = repo
        .commit_trade(follow_up(&holding, dec!(11), dec!(152), 3))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConcurrencyConflict { ref symbol, .. } if symbol == "AAPL"));
    let stored = repo.get_holding("u1", "AAPL").unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.average_cost, dec!(151));
    let all = repo.list_transactions("u1", &TransactionFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_second_opening_commit_conflicts() {
    let (repo, _dir) = seeded().await;
    repo.commit_trade(opening("u1", "MSFT", dec!(1), dec!(300))).await.unwrap();

    let err = repo
        .commit_trade(opening("u1", "MSFT", dec!(2), dec!(310)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConcurrencyConflict { .. }));
    assert_eq!(repo.get_holding("u1", "MSFT").unwrap().unwrap().quantity, dec!(1));
}

#[tokio::test]
async fn test_delete_change_closes_holding() {
    let (repo, _dir) = seeded().await;
    let holding = repo
        .commit_trade(opening("u1", "AAPL", dec!(5), dec!(100)))
        .await
        .unwrap()
        .holding
        .unwrap();

    let outcome = repo
        .commit_trade(TradeCommit {
            user_id: "u1".to_string(),
            symbol: "AAPL".to_string(),
            expected_version: Some(holding.version),
            transaction: transaction("u1", "AAPL", TradeType::Sell, dec!(5), dec!(120), at(2)),
            holding_change: HoldingChange::Delete {
                holding_id: holding.id.clone(),
            },
        })
        .await
        .unwrap();

    assert!(outcome.holding.is_none());
    assert!(repo.get_holding("u1", "AAPL").unwrap().is_none());
    assert!(repo.list_holdings("u1").unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_user_violates_foreign_key() {
    let (repo, _dir) = seeded().await;
    let err = repo
        .commit_trade(opening("ghost", "AAPL", dec!(1), dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(DatabaseError::ForeignKeyViolation(_))));
    assert!(repo.list_transactions("ghost", &TransactionFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn test_transaction_listing_filters_and_orders() {
    let (repo, _dir) = seeded().await;
    let aapl = repo
        .commit_trade(opening("u1", "AAPL", dec!(10), dec!(150)))
        .await
        .unwrap()
        .holding
        .unwrap();
    repo.commit_trade(follow_up(&aapl, dec!(11), dec!(150), 4)).await.unwrap();
    repo.commit_trade(opening("u1", "MSFT", dec!(1), dec!(300))).await.unwrap();
    repo.commit_trade(opening("u2", "AAPL", dec!(1), dec!(150))).await.unwrap();

    let all = repo.list_transactions("u1", &TransactionFilter::default()).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].executed_at, at(4));
    assert!(all.iter().all(|t| t.user_id == "u1"));

    let newest_apple = repo
        .list_transactions(
            "u1",
            &TransactionFilter {
                symbol: Some("AAPL".to_string()),
                trade_type: Some(TradeType::Buy),
                limit: Some(1),
            },
        )
        .unwrap();
    assert_eq!(newest_apple.len(), 1);
    assert_eq!(newest_apple[0].executed_at, at(4));

    let sells = repo
        .list_transactions(
            "u1",
            &TransactionFilter {
                trade_type: Some(TradeType::Sell),
                ..TransactionFilter::default()
            },
        )
        .unwrap();
    assert!(sells.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_transaction_rows() {
    let (repo, _dir) = seeded().await;
    let outcome = repo.commit_trade(opening("u1", "AAPL", dec!(10), dec!(150))).await.unwrap();

    let corrected = Transaction {
        quantity: dec!(12),
        fees: dec!(2),
        total_amount: dec!(1802),
        notes: Some("broker statement".to_string()),
        executed_at: outcome.transaction.executed_at - Duration::hours(1),
        ..outcome.transaction.clone()
    };
    repo.update_transaction(corrected.clone()).await.unwrap();
    assert_eq!(repo.get_transaction(&corrected.id).unwrap(), corrected);
    // Rewriting the row leaves the holding alone.
    assert_eq!(repo.get_holding("u1", "AAPL").unwrap().unwrap().quantity, dec!(10));

    assert_eq!(repo.delete_transaction(&corrected.id).await.unwrap(), 1);
    assert_eq!(repo.delete_transaction(&corrected.id).await.unwrap(), 0);
    assert!(matches!(
        repo.get_transaction(&corrected.id),
        Err(Error::Database(DatabaseError::NotFound(_)))
    ));

    let missing = repo.update_transaction(corrected).await.unwrap_err();
    assert!(matches!(missing, Error::Database(DatabaseError::NotFound(_))));
}
