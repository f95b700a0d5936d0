use crate::domain::errors::SourceError;
use crate::domain::market::Bar;
use chrono::DateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

pub(super) const SOURCE_NAME: &str = "Alpaca";

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: String,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

impl AlpacaBar {
    pub fn to_bar(&self) -> Result<Bar, SourceError> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| SourceError::data_shape(SOURCE_NAME, format!("bad bar time {:?}: {}", self.timestamp, e)))?
            .timestamp_millis();

        let price = |value: f64, name: &str| {
            Decimal::from_f64(value)
                .ok_or_else(|| SourceError::data_shape(SOURCE_NAME, format!("{} is not finite: {}", name, value)))
        };

        Ok(Bar {
            timestamp,
            open: price(self.open, "open")?,
            high: price(self.high, "high")?,
            low: price(self.low, "low")?,
            close: price(self.close, "close")?,
            volume: price(self.volume, "volume")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_alpaca_bar_conversion() {
        let bar: AlpacaBar = serde_json::from_str(
            r#"{"t": "2024-01-03T05:00:00Z", "o": 184.22, "h": 185.88, "l": 183.43, "c": 184.25, "v": 58414460, "n": 1, "vw": 184.3}"#,
        )
        .unwrap();

        let converted = bar.to_bar().unwrap();
        assert_eq!(converted.timestamp, 1704258000000);
        assert_eq!(converted.high, dec!(185.88));
        assert_eq!(converted.volume, dec!(58414460));
    }

    #[test]
    fn test_alpaca_bar_rejects_bad_timestamp() {
        let bar = AlpacaBar {
            timestamp: "yesterday".to_string(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        };
        assert!(matches!(bar.to_bar(), Err(SourceError::DataShape { .. })));
    }
}
