//! One scan run: universe, near-ATH feed, batched evaluation, persistence,
//! digest and price alerts.

use super::evaluator::SignalEvaluator;
use super::scheduler::BatchScheduler;
use super::universe::{ExclusionFilter, SymbolUniverseProvider};
use crate::application::alert_engine::AlertEngine;
use crate::application::notifier::DigestNotifier;
use crate::domain::errors::PersistenceError;
use crate::domain::market::{AssetClass, Symbol};
use crate::domain::ports::{AthFeed, BarSource, PriceSource};
use crate::domain::repositories::WatchlistRepository;
use crate::domain::signal::{CandidateSignal, merge_signals};
use crate::domain::watchlist::WatchlistEntry;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub universe_size: usize,
    /// Symbols evaluated through bars (near-ATH symbols are not).
    pub evaluated: usize,
    pub signals: usize,
    pub failed: usize,
    pub persisted: usize,
    pub alerts_sent: usize,
}

/// Near-ATH classification fed straight into the candidate set.
pub struct AthStage {
    pub feed: Arc<dyn AthFeed>,
    /// Source of the tradable listing that ATH symbols are restricted to.
    pub listing: Arc<dyn BarSource>,
}

pub struct ScanPipeline {
    asset_class: AssetClass,
    universe_size: usize,
    universe: SymbolUniverseProvider,
    exclusion: ExclusionFilter,
    ath: Option<AthStage>,
    evaluator: SignalEvaluator,
    scheduler: BatchScheduler,
    watchlist: Arc<dyn WatchlistRepository>,
    digest: DigestNotifier,
    prices: Arc<dyn PriceSource>,
    alerts: AlertEngine,
}

impl ScanPipeline {
    pub fn builder() -> ScanPipelineBuilder {
        ScanPipelineBuilder::default()
    }

    /// Only a watchlist persistence failure fails the run.
    pub async fn run(&self, limit: Option<usize>) -> Result<RunReport, PersistenceError> {
        let n = limit.unwrap_or(self.universe_size);
        info!("ScanPipeline: Starting {} scan (universe {})", self.asset_class, n);

        let universe = self.universe.resolve(n).await;
        let mut report = RunReport {
            universe_size: universe.len(),
            ..RunReport::default()
        };

        let ath_signals = self.near_ath_signals(n, &universe).await;
        let ath_symbols: HashSet<&Symbol> = ath_signals.iter().map(|s| &s.symbol).collect();
        let to_evaluate: Vec<Symbol> = universe
            .iter()
            .filter(|s| !ath_symbols.contains(s))
            .cloned()
            .collect();

        let summary = self.evaluator.evaluate_all(to_evaluate, &self.scheduler).await;
        report.evaluated = summary.evaluated;
        report.failed = summary.failed;

        let signals = merge_signals(ath_signals.into_iter().chain(summary.signals));
        report.signals = signals.len();

        if signals.is_empty() {
            warn!(
                "ScanPipeline: No {} candidates this run, keeping previous watchlist",
                self.asset_class
            );
            return Ok(report);
        }

        let entries: Vec<WatchlistEntry> = signals.iter().map(WatchlistEntry::from).collect();
        self.watchlist.replace_all(&entries).await?;
        report.persisted = entries.len();

        self.digest.publish(self.asset_class, &signals).await;
        report.alerts_sent = self.check_alerts(&signals).await;

        info!(
            "ScanPipeline: {} scan done: universe={} evaluated={} signals={} failed={} persisted={} alerts={}",
            self.asset_class,
            report.universe_size,
            report.evaluated,
            report.signals,
            report.failed,
            report.persisted,
            report.alerts_sent
        );
        Ok(report)
    }

    async fn near_ath_signals(&self, n: usize, universe: &[Symbol]) -> Vec<CandidateSignal> {
        let Some(stage) = &self.ath else {
            return Vec::new();
        };

        let instruments = match stage.feed.near_ath(n).await {
            Ok(instruments) => instruments,
            Err(e) => {
                warn!("ScanPipeline: Near-ATH feed {} failed: {}", stage.feed.name(), e);
                return Vec::new();
            }
        };

        let allowed: HashSet<Symbol> = match stage.listing.list_symbols().await {
            Ok(listed) if !listed.is_empty() => listed.into_iter().collect(),
            Ok(_) | Err(_) => {
                warn!(
                    "ScanPipeline: {} listing unavailable, restricting near-ATH symbols to the universe",
                    stage.listing.name()
                );
                universe.iter().cloned().collect()
            }
        };

        let now = Utc::now();
        let signals: Vec<CandidateSignal> = instruments
            .into_iter()
            .filter(|i| !self.exclusion.is_excluded(&i.base_asset))
            .filter(|i| allowed.contains(&i.symbol))
            .map(|i| CandidateSignal::near_ath(i.symbol, now))
            .collect();

        info!("ScanPipeline: {} symbols near ATH", signals.len());
        signals
    }

    async fn check_alerts(&self, signals: &[CandidateSignal]) -> usize {
        let symbols: Vec<Symbol> = signals.iter().map(|s| s.symbol.clone()).collect();
        match self.prices.latest_prices(&symbols).await {
            Ok(prices) => self.alerts.check(self.asset_class, &prices).await,
            Err(e) => {
                warn!("ScanPipeline: Price lookup via {} failed, skipping alerts: {}", self.prices.name(), e);
                0
            }
        }
    }
}

#[derive(Default)]
pub struct ScanPipelineBuilder {
    asset_class: Option<AssetClass>,
    universe_size: Option<usize>,
    universe: Option<SymbolUniverseProvider>,
    exclusion: Option<ExclusionFilter>,
    ath: Option<AthStage>,
    evaluator: Option<SignalEvaluator>,
    scheduler: Option<BatchScheduler>,
    watchlist: Option<Arc<dyn WatchlistRepository>>,
    digest: Option<DigestNotifier>,
    prices: Option<Arc<dyn PriceSource>>,
    alerts: Option<AlertEngine>,
}

impl ScanPipelineBuilder {
    pub fn asset_class(mut self, asset_class: AssetClass) -> Self {
        self.asset_class = Some(asset_class);
        self
    }

    pub fn universe_size(mut self, universe_size: usize) -> Self {
        self.universe_size = Some(universe_size);
        self
    }

    pub fn universe(mut self, universe: SymbolUniverseProvider) -> Self {
        self.universe = Some(universe);
        self
    }

    pub fn exclusion(mut self, exclusion: ExclusionFilter) -> Self {
        self.exclusion = Some(exclusion);
        self
    }

    pub fn ath(mut self, ath: AthStage) -> Self {
        self.ath = Some(ath);
        self
    }

    pub fn evaluator(mut self, evaluator: SignalEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn scheduler(mut self, scheduler: BatchScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn watchlist(mut self, watchlist: Arc<dyn WatchlistRepository>) -> Self {
        self.watchlist = Some(watchlist);
        self
    }

    pub fn digest(mut self, digest: DigestNotifier) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn prices(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn alerts(mut self, alerts: AlertEngine) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn build(self) -> anyhow::Result<ScanPipeline> {
        Ok(ScanPipeline {
            asset_class: self.asset_class.unwrap_or(AssetClass::Crypto),
            universe_size: self.universe_size.unwrap_or(50),
            universe: self
                .universe
                .ok_or_else(|| anyhow::anyhow!("universe provider is required"))?,
            exclusion: self.exclusion.unwrap_or_default(),
            ath: self.ath,
            evaluator: self
                .evaluator
                .ok_or_else(|| anyhow::anyhow!("signal evaluator is required"))?,
            scheduler: self
                .scheduler
                .unwrap_or_else(|| BatchScheduler::new(10, std::time::Duration::from_millis(200))),
            watchlist: self
                .watchlist
                .ok_or_else(|| anyhow::anyhow!("watchlist repository is required"))?,
            digest: self.digest.ok_or_else(|| anyhow::anyhow!("digest notifier is required"))?,
            prices: self.prices.ok_or_else(|| anyhow::anyhow!("price source is required"))?,
            alerts: self.alerts.ok_or_else(|| anyhow::anyhow!("alert engine is required"))?,
        })
    }
}
