use super::symbol::Symbol;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. `timestamp` is the bar open time in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Bars for one symbol, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: Symbol, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self { symbol, bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Highest high over the series.
    pub fn max_high(&self) -> Option<Decimal> {
        self.bars.iter().map(|b| b.high).max()
    }

    /// Close of the newest bar.
    pub fn last_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }
}

/// Lookback window for a daily bar request.
///
/// Adapters that page by count use `limit()`; adapters that page by time
/// range use `start()`/`end()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarWindow {
    pub lookback_days: u32,
    pub end: DateTime<Utc>,
}

impl BarWindow {
    pub fn daily(lookback_days: u32) -> Self {
        Self {
            lookback_days,
            end: Utc::now(),
        }
    }

    pub fn ending_at(lookback_days: u32, end: DateTime<Utc>) -> Self {
        Self { lookback_days, end }
    }

    /// Saturates at the earliest representable instant.
    pub fn start(&self) -> DateTime<Utc> {
        Duration::try_days(i64::from(self.lookback_days))
            .and_then(|d| self.end.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn limit(&self) -> u32 {
        self.lookback_days.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn bar(ts: i64, high: i64, close: i64) -> Bar {
        Bar {
            timestamp: ts,
            open: Decimal::from(close),
            high: Decimal::from(high),
            low: Decimal::from(close),
            close: Decimal::from(close),
            volume: Decimal::ONE,
        }
    }

    #[test]
    fn test_series_sorted_oldest_first() {
        let series = BarSeries::new(
            Symbol::new("BTCUSDT").unwrap(),
            vec![bar(3, 10, 9), bar(1, 12, 11), bar(2, 15, 14)],
        );
        assert_eq!(series.max_high(), Some(Decimal::from(15)));
        assert_eq!(series.last_close(), Some(Decimal::from(9)));
    }

    #[test]
    fn test_window_bounds() {
        let end = DateTime::parse_from_rfc3339("2025-01-31T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let window = BarWindow::ending_at(30, end);
        assert_eq!(window.start().to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert_eq!(window.limit(), 30);
    }

    #[test]
    fn test_window_start_saturates() {
        let window = BarWindow::ending_at(u32::MAX, Utc::now());
        assert_eq!(window.start(), DateTime::<Utc>::MIN_UTC);
    }
}
