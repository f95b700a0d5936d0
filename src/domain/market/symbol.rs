use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Symbol is empty")]
    Empty,

    #[error("Symbol contains whitespace: {raw:?}")]
    Whitespace { raw: String },
}

/// Normalized instrument identifier.
///
/// Normalization trims, upper-cases and drops `/` separators so that
/// `btc/usdt`, `BTC/USDT` and `BTCUSDT` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: &str) -> Result<Self, SymbolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SymbolError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(SymbolError::Whitespace {
                raw: raw.to_string(),
            });
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '/')
            .flat_map(char::to_uppercase)
            .collect();

        if normalized.is_empty() {
            return Err(SymbolError::Empty);
        }

        Ok(Self(normalized))
    }

    /// Builds a pair symbol from a base asset and a quote asset (`BTC` + `USDT`).
    pub fn pair(base: &str, quote: &str) -> Result<Self, SymbolError> {
        Self::new(&format!("{}{}", base.trim(), quote.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new("btcusdt").unwrap().as_str(), "BTCUSDT");
        assert_eq!(Symbol::new(" ETH/USDT ").unwrap().as_str(), "ETHUSDT");
        assert_eq!(Symbol::new("brk.b").unwrap().as_str(), "BRK.B");
        assert_eq!(Symbol::new("eth/usdt").unwrap(), Symbol::new("ETHUSDT").unwrap());
    }

    #[test]
    fn test_symbol_rejects_invalid_input() {
        assert_eq!(Symbol::new("   "), Err(SymbolError::Empty));
        assert_eq!(Symbol::new("/"), Err(SymbolError::Empty));
        assert!(matches!(
            Symbol::new("BTC USDT"),
            Err(SymbolError::Whitespace { .. })
        ));
    }

    #[test]
    fn test_pair_joins_base_and_quote() {
        let btc = Symbol::pair("btc", " USDT").unwrap();
        assert_eq!(btc.as_str(), "BTCUSDT");
        assert!(Symbol::pair("", "").is_err());
    }
}
