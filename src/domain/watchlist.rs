use crate::domain::market::Symbol;
use crate::domain::signal::CandidateSignal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted watchlist row. `symbol` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: Symbol,
    pub is_ath: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&CandidateSignal> for WatchlistEntry {
    fn from(signal: &CandidateSignal) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            is_ath: signal.is_ath,
            updated_at: signal.evaluated_at,
        }
    }
}
