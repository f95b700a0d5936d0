//! Fixed, configured instrument list used as the stock universe fallback.

use crate::domain::errors::SourceError;
use crate::domain::market::Symbol;
use crate::domain::ports::{RankedInstrument, UniverseSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

pub struct StaticUniverse {
    symbols: Vec<Symbol>,
}

impl StaticUniverse {
    /// Invalid entries are dropped with a warning; duplicates keep their first position.
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(raw.len());
        for entry in raw {
            match Symbol::new(entry.as_ref()) {
                Ok(symbol) if !symbols.contains(&symbol) => symbols.push(symbol),
                Ok(_) => {}
                Err(e) => warn!("StaticUniverse: Ignoring {:?}: {}", entry.as_ref(), e),
            }
        }
        Self { symbols }
    }
}

#[async_trait]
impl UniverseSource for StaticUniverse {
    fn name(&self) -> &str {
        "StaticList"
    }

    /// Configured order is the ranking.
    async fn ranked_instruments(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        if self.symbols.is_empty() {
            return Err(SourceError::empty(self.name(), "configured symbol list"));
        }

        let total = self.symbols.len();
        Ok(self
            .symbols
            .iter()
            .take(limit)
            .enumerate()
            .map(|(rank, symbol)| RankedInstrument {
                symbol: symbol.clone(),
                base_asset: symbol.as_str().to_string(),
                liquidity: Decimal::from(total - rank),
            })
            .collect())
    }
}
