//! Symbol universe resolution: ranked listing, fallback listing, exclusion.

use crate::domain::market::Symbol;
use crate::domain::ports::{RankedInstrument, UniverseSource};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Exact, case-insensitive match on an instrument's base asset.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    keywords: HashSet<String>,
}

impl ExclusionFilter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_excluded(&self, base_asset: &str) -> bool {
        self.keywords.contains(&base_asset.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

pub struct SymbolUniverseProvider {
    primary: Arc<dyn UniverseSource>,
    secondary: Option<Arc<dyn UniverseSource>>,
    filter: ExclusionFilter,
}

impl SymbolUniverseProvider {
    pub fn new(
        primary: Arc<dyn UniverseSource>,
        secondary: Option<Arc<dyn UniverseSource>>,
        filter: ExclusionFilter,
    ) -> Self {
        Self {
            primary,
            secondary,
            filter,
        }
    }

    /// Up to `n` symbols, most liquid first, excluded base assets removed.
    ///
    /// Falls back to the secondary source when the primary errors or leaves
    /// nothing after exclusion. When both fail the universe is empty.
    pub async fn resolve(&self, n: usize) -> Vec<Symbol> {
        if n == 0 {
            return Vec::new();
        }
        // Over-fetch so exclusions do not starve the result; sources clamp to their page size.
        let fetch_limit = n.saturating_mul(2);

        let primary = self.selection(self.primary.as_ref(), n, fetch_limit).await;
        if !primary.is_empty() {
            return primary;
        }

        match &self.secondary {
            Some(secondary) => {
                info!("SymbolUniverseProvider: Falling back to {}", secondary.name());
                let symbols = self.selection(secondary.as_ref(), n, fetch_limit).await;
                if symbols.is_empty() {
                    warn!("SymbolUniverseProvider: All universe sources failed, universe is empty");
                }
                symbols
            }
            None => {
                warn!("SymbolUniverseProvider: No fallback universe source, universe is empty");
                Vec::new()
            }
        }
    }

    async fn selection(&self, source: &dyn UniverseSource, n: usize, fetch_limit: usize) -> Vec<Symbol> {
        match source.ranked_instruments(fetch_limit).await {
            Ok(ranked) if ranked.is_empty() => {
                warn!("SymbolUniverseProvider: {} returned an empty listing", source.name());
                Vec::new()
            }
            Ok(ranked) => self.select(ranked, n, source.name()),
            Err(e) => {
                warn!("SymbolUniverseProvider: {} failed: {}", source.name(), e);
                Vec::new()
            }
        }
    }

    fn select(&self, mut ranked: Vec<RankedInstrument>, n: usize, source_name: &str) -> Vec<Symbol> {
        // Stable sort keeps the source order for equal liquidity.
        ranked.sort_by(|a, b| b.liquidity.cmp(&a.liquidity));

        let mut seen: HashSet<Symbol> = HashSet::new();
        let mut excluded = 0usize;
        let mut symbols = Vec::with_capacity(n);

        for instrument in ranked {
            if self.filter.is_excluded(&instrument.base_asset) {
                excluded += 1;
                continue;
            }
            if seen.insert(instrument.symbol.clone()) {
                symbols.push(instrument.symbol);
            }
            if symbols.len() == n {
                break;
            }
        }

        info!(
            "SymbolUniverseProvider: {} symbols from {} ({} excluded)",
            symbols.len(),
            source_name,
            excluded
        );
        symbols
    }
}
