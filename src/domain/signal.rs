//! Extremum-proximity signals.
//!
//! A symbol is "near high" when its last close sits within `threshold` of the
//! highest high of its lookback window:
//!
//! ```text
//! (H - C) / H <= threshold
//! ```

use crate::domain::market::{BarSeries, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A symbol that qualified for the watchlist in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub symbol: Symbol,
    pub is_ath: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl CandidateSignal {
    pub fn near_ath(symbol: Symbol, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            is_ath: true,
            evaluated_at,
        }
    }

    pub fn near_high(symbol: Symbol, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            is_ath: false,
            evaluated_at,
        }
    }
}

/// Measured distance of the last close from the window high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighProximity {
    pub high: Decimal,
    pub close: Decimal,
    /// `(high - close) / high`; negative when the close prints above every high.
    pub gap: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearHighRule {
    threshold: Decimal,
}

impl NearHighRule {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// Returns `None` for an empty series or a non-positive high.
    pub fn proximity(&self, series: &BarSeries) -> Option<HighProximity> {
        let high = series.max_high()?;
        let close = series.last_close()?;
        if high <= Decimal::ZERO {
            return None;
        }
        Some(HighProximity {
            high,
            close,
            gap: (high - close) / high,
        })
    }

    pub fn is_near_high(&self, proximity: &HighProximity) -> bool {
        proximity.gap <= self.threshold
    }

    pub fn evaluate(&self, series: &BarSeries, evaluated_at: DateTime<Utc>) -> Option<CandidateSignal> {
        let proximity = self.proximity(series)?;
        self.is_near_high(&proximity)
            .then(|| CandidateSignal::near_high(series.symbol.clone(), evaluated_at))
    }
}

impl Default for NearHighRule {
    fn default() -> Self {
        Self::new(Decimal::new(10, 2))
    }
}

/// Collapses duplicates to one signal per symbol, in first-seen order.
/// An ATH classification wins over a windowed one.
pub fn merge_signals(signals: impl IntoIterator<Item = CandidateSignal>) -> Vec<CandidateSignal> {
    let mut order: Vec<Symbol> = Vec::new();
    let mut by_symbol: HashMap<Symbol, CandidateSignal> = HashMap::new();

    for signal in signals {
        match by_symbol.get_mut(&signal.symbol) {
            Some(existing) => {
                if signal.is_ath && !existing.is_ath {
                    *existing = signal;
                }
            }
            None => {
                order.push(signal.symbol.clone());
                by_symbol.insert(signal.symbol.clone(), signal);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|symbol| by_symbol.remove(&symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Bar;

    fn series(points: &[(i64, i64)]) -> BarSeries {
        let bars = points
            .iter()
            .enumerate()
            .map(|(i, (high, close))| Bar {
                timestamp: i as i64,
                open: Decimal::from(*close),
                high: Decimal::from(*high),
                low: Decimal::from(*close),
                close: Decimal::from(*close),
                volume: Decimal::ONE,
            })
            .collect();
        BarSeries::new(Symbol::new("ETHUSDT").unwrap(), bars)
    }

    #[test]
    fn test_near_high_boundary() {
        let rule = NearHighRule::default();
        let now = Utc::now();

        // Exactly 10% below the high qualifies
        let at_boundary = series(&[(100, 95), (80, 90)]);
        assert!(rule.evaluate(&at_boundary, now).is_some());

        // Just beyond the threshold does not
        let below = series(&[(100, 95), (80, 89)]);
        assert!(rule.evaluate(&below, now).is_none());
    }

    #[test]
    fn test_windowed_signal_is_not_ath() {
        let rule = NearHighRule::default();
        let signal = rule.evaluate(&series(&[(100, 99)]), Utc::now()).unwrap();
        assert!(!signal.is_ath);
        assert_eq!(signal.symbol.as_str(), "ETHUSDT");
    }

    #[test]
    fn test_empty_series_has_no_signal() {
        let rule = NearHighRule::default();
        assert!(rule.evaluate(&series(&[]), Utc::now()).is_none());
        assert!(rule.evaluate(&series(&[(0, 0)]), Utc::now()).is_none());
    }

    #[test]
    fn test_merge_prefers_ath() {
        let now = Utc::now();
        let btc = Symbol::new("BTCUSDT").unwrap();
        let eth = Symbol::new("ETHUSDT").unwrap();

        let merged = merge_signals(vec![
            CandidateSignal::near_high(btc.clone(), now),
            CandidateSignal::near_high(eth.clone(), now),
            CandidateSignal::near_ath(btc.clone(), now),
            CandidateSignal::near_high(eth.clone(), now),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].symbol, btc);
        assert!(merged[0].is_ath);
        assert_eq!(merged[1].symbol, eth);
        assert!(!merged[1].is_ath);
    }
}
