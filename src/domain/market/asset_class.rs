use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset class of an instrument.
///
/// Every variant is a valid alert `asset_type`; only `Crypto` and `Stock`
/// have a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Crypto,
    Stock,
    Forex,
    Gold,
    Silver,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Stock => "stock",
            AssetClass::Forex => "forex",
            AssetClass::Gold => "gold",
            AssetClass::Silver => "silver",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crypto" => Ok(AssetClass::Crypto),
            "stock" => Ok(AssetClass::Stock),
            "forex" => Ok(AssetClass::Forex),
            "gold" => Ok(AssetClass::Gold),
            "silver" => Ok(AssetClass::Silver),
            _ => anyhow::bail!(
                "Invalid asset class: {}. Must be 'crypto', 'stock', 'forex', 'gold' or 'silver'",
                s
            ),
        }
    }
}
