//! Kline row parsing shared by Binance and MEXC.
//!
//! Both venues answer `/api/v3/klines` with an array of positional rows:
//! `[open_time, open, high, low, close, volume, close_time, ...]`, prices as
//! JSON strings. A single malformed row rejects the whole payload.

use crate::domain::errors::SourceError;
use crate::domain::market::{Bar, BarSeries, Symbol};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

const MIN_COLUMNS: usize = 6;

pub fn parse_klines(source_name: &str, symbol: &Symbol, rows: Vec<Vec<Value>>) -> Result<BarSeries, SourceError> {
    let bars = rows
        .iter()
        .enumerate()
        .map(|(index, row)| parse_row(source_name, index, row))
        .collect::<Result<Vec<_>, _>>()?;

    if bars.is_empty() {
        return Err(SourceError::empty(source_name, format!("klines for {}", symbol)));
    }

    Ok(BarSeries::new(symbol.clone(), bars))
}

fn parse_row(source_name: &str, index: usize, row: &[Value]) -> Result<Bar, SourceError> {
    if row.len() < MIN_COLUMNS {
        return Err(SourceError::data_shape(
            source_name,
            format!("kline row {} has {} columns, expected at least {}", index, row.len(), MIN_COLUMNS),
        ));
    }

    let timestamp = row[0].as_i64().ok_or_else(|| {
        SourceError::data_shape(source_name, format!("kline row {}: open time is not an integer", index))
    })?;

    let column = |position: usize, name: &str| -> Result<Decimal, SourceError> {
        decimal_cell(&row[position]).ok_or_else(|| {
            SourceError::data_shape(
                source_name,
                format!("kline row {}: {} is not numeric: {}", index, name, row[position]),
            )
        })
    };

    let bar = Bar {
        timestamp,
        open: column(1, "open")?,
        high: column(2, "high")?,
        low: column(3, "low")?,
        close: column(4, "close")?,
        volume: column(5, "volume")?,
    };

    if bar.high < bar.low {
        return Err(SourceError::data_shape(
            source_name,
            format!("kline row {}: high {} below low {}", index, bar.high, bar.low),
        ));
    }

    Ok(bar)
}

fn decimal_cell(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(text) => Decimal::from_str(text).ok(),
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_binance_rows() {
        let symbol = Symbol::new("BTCUSDT").unwrap();
        let payload = rows(json!([
            [1700086400000_i64, "36000.0", "37000.5", "35500.0", "36900.1", "1200.5", 1700172799999_i64],
            [1700000000000_i64, "35000.0", "36100.0", "34900.0", "36000.0", "980.0", 1700086399999_i64]
        ]));

        let series = parse_klines("Binance", &symbol, payload).unwrap();
        assert_eq!(series.len(), 2);
        // Sorted oldest first regardless of payload order
        assert_eq!(series.bars[0].timestamp, 1700000000000);
        assert_eq!(series.max_high(), Some(dec!(37000.5)));
        assert_eq!(series.last_close(), Some(dec!(36900.1)));
    }

    #[test]
    fn test_parse_accepts_numeric_cells() {
        let symbol = Symbol::new("ETHUSDT").unwrap();
        let payload = rows(json!([[1700000000000_i64, 2000, 2100.5, 1990, 2050, 10]]));

        let series = parse_klines("MEXC", &symbol, payload).unwrap();
        assert_eq!(series.bars[0].high, dec!(2100.5));
    }

    #[test]
    fn test_short_row_is_data_shape_error() {
        let symbol = Symbol::new("ETHUSDT").unwrap();
        let payload = rows(json!([[1700000000000_i64, "1", "2", "0.5", "1.5"]]));

        let err = parse_klines("MEXC", &symbol, payload).unwrap_err();
        assert!(matches!(err, SourceError::DataShape { .. }));
        assert!(err.to_string().contains("5 columns"));
    }

    #[test]
    fn test_non_numeric_cell_rejects_payload() {
        let symbol = Symbol::new("ETHUSDT").unwrap();
        let payload = rows(json!([
            [1700000000000_i64, "1", "2", "0.5", "1.5", "10"],
            [1700086400000_i64, "1", "n/a", "0.5", "1.5", "10"]
        ]));

        let err = parse_klines("Binance", &symbol, payload).unwrap_err();
        assert!(matches!(err, SourceError::DataShape { .. }));
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_empty_payload_is_empty_error() {
        let symbol = Symbol::new("ETHUSDT").unwrap();
        let err = parse_klines("Binance", &symbol, Vec::new()).unwrap_err();
        assert!(matches!(err, SourceError::Empty { .. }));
    }
}
