pub mod price_alert_repository;
pub mod watchlist_repository;

pub use price_alert_repository::SqlitePriceAlertRepository;
pub use watchlist_repository::SqliteWatchlistRepository;
