mod common;

use chrono::Utc;
use common::{symbol, temp_database};
use peakwatch::domain::errors::PersistenceError;
use peakwatch::domain::repositories::WatchlistRepository;
use peakwatch::domain::watchlist::WatchlistEntry;
use peakwatch::infrastructure::persistence::SqliteWatchlistRepository;

fn entry(raw: &str, is_ath: bool) -> WatchlistEntry {
    WatchlistEntry {
        symbol: symbol(raw),
        is_ath,
        updated_at: Utc::now(),
    }
}

fn summary(entries: &[WatchlistEntry]) -> Vec<(String, bool)> {
    entries
        .iter()
        .map(|e| (e.symbol.as_str().to_string(), e.is_ath))
        .collect()
}

#[tokio::test]
async fn test_replace_all_swaps_whole_set() {
    let (_dir, db) = temp_database().await;
    let repo = SqliteWatchlistRepository::new(db.pool.clone());

    repo.replace_all(&[entry("ETHUSDT", false), entry("BTCUSDT", true)])
        .await
        .unwrap();
    repo.replace_all(&[entry("SOLUSDT", false), entry("ADAUSDT", false)])
        .await
        .unwrap();

    let stored = repo.get_all().await.unwrap();
    assert_eq!(
        summary(&stored),
        vec![("ADAUSDT".to_string(), false), ("SOLUSDT".to_string(), false)]
    );
}

#[tokio::test]
async fn test_duplicate_symbols_collapse_to_one_row() {
    let (_dir, db) = temp_database().await;
    let repo = SqliteWatchlistRepository::new(db.pool.clone());

    repo.replace_all(&[entry("BTCUSDT", false), entry("BTCUSDT", true)])
        .await
        .unwrap();

    let stored = repo.get_all().await.unwrap();
    assert_eq!(summary(&stored), vec![("BTCUSDT".to_string(), true)]);
}

#[tokio::test]
async fn test_failed_insert_keeps_previous_content() {
    let (_dir, db) = temp_database().await;
    let repo = SqliteWatchlistRepository::new(db.pool.clone());

    repo.replace_all(&[entry("BTCUSDT", true), entry("ETHUSDT", false)])
        .await
        .unwrap();
    let before = summary(&repo.get_all().await.unwrap());

    sqlx::query(
        "CREATE TRIGGER reject_fail BEFORE INSERT ON watchlist \
         WHEN NEW.symbol = 'FAILUSDT' BEGIN SELECT RAISE(ABORT, 'forced'); END;",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let result = repo
        .replace_all(&[entry("SOLUSDT", false), entry("FAILUSDT", false)])
        .await;

    assert!(matches!(result, Err(PersistenceError::Database { .. })));
    assert_eq!(summary(&repo.get_all().await.unwrap()), before);
}

#[tokio::test]
async fn test_large_sets_span_several_statements() {
    let (_dir, db) = temp_database().await;
    let repo = SqliteWatchlistRepository::new(db.pool.clone());

    let entries: Vec<WatchlistEntry> = (0..750).map(|i| entry(&format!("C{:04}USDT", i), i % 7 == 0)).collect();
    repo.replace_all(&entries).await.unwrap();

    let stored = repo.get_all().await.unwrap();
    assert_eq!(stored.len(), 750);
    assert_eq!(stored[0].symbol.as_str(), "C0000USDT");
    assert!(stored[0].is_ath);
    assert_eq!(stored[749].symbol.as_str(), "C0749USDT");
}

#[tokio::test]
async fn test_empty_replace_clears_table() {
    let (_dir, db) = temp_database().await;
    let repo = SqliteWatchlistRepository::new(db.pool.clone());

    repo.replace_all(&[entry("BTCUSDT", true)]).await.unwrap();
    repo.replace_all(&[]).await.unwrap();

    assert!(repo.get_all().await.unwrap().is_empty());
}
