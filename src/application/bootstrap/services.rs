use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::alert_engine::AlertEngine;
use crate::application::bootstrap::persistence::PersistenceHandle;
use crate::application::notifier::DigestNotifier;
use crate::application::scanning::{
    AthStage, BatchScheduler, ExclusionFilter, ScanPipeline, SignalEvaluator, SymbolUniverseProvider,
};
use crate::config::{Config, SourceEnvConfig};
use crate::domain::market::AssetClass;
use crate::domain::ports::{BarSource, PriceSource, UniverseSource};
use crate::domain::signal::NearHighRule;
use crate::infrastructure::{
    AlpacaMarketDataService, BinanceMarketDataService, CoinGeckoClient, MexcMarketDataService, StaticUniverse,
    WebhookNotifier, YahooChartClient,
};

/// Adapters selected for one asset class.
struct SourceSet {
    universe_primary: Arc<dyn UniverseSource>,
    universe_secondary: Option<Arc<dyn UniverseSource>>,
    bars_primary: Arc<dyn BarSource>,
    bars_secondary: Option<Arc<dyn BarSource>>,
    ath: Option<AthStage>,
    prices: Arc<dyn PriceSource>,
    exclusion: ExclusionFilter,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    pub fn scan_pipeline(
        config: &Config,
        asset_class: AssetClass,
        persistence: &PersistenceHandle,
    ) -> Result<ScanPipeline> {
        let sources = match asset_class {
            AssetClass::Crypto => Self::crypto_sources(config),
            AssetClass::Stock => Self::stock_sources(config),
            other => bail!("No scanner available for asset class {}", other),
        };

        let scanner = &config.scanner;
        let evaluator = SignalEvaluator::new(
            sources.bars_primary,
            sources.bars_secondary,
            NearHighRule::new(scanner.near_high_threshold),
            scanner.lookback_days,
            config.sources.bar_timeout,
        );

        let notifications = &config.notifications;
        let sink = Arc::new(WebhookNotifier::from_config(notifications));
        if notifications.enabled && !sink.is_configured() {
            warn!("ServicesBootstrap: Notifications enabled but SLACK_WEBHOOK_URL is not set");
        }
        let digest = DigestNotifier::new(sink, notifications.enabled, notifications.digest_max_items);

        let mut builder = ScanPipeline::builder()
            .asset_class(asset_class)
            .universe_size(scanner.universe_size)
            .universe(SymbolUniverseProvider::new(
                sources.universe_primary,
                sources.universe_secondary,
                sources.exclusion.clone(),
            ))
            .exclusion(sources.exclusion)
            .evaluator(evaluator)
            .scheduler(BatchScheduler::new(scanner.batch_size, scanner.batch_delay))
            .watchlist(persistence.watchlist_repository.clone())
            .digest(digest)
            .prices(sources.prices)
            .alerts(Self::alert_engine(config, persistence));
        if let Some(ath) = sources.ath {
            builder = builder.ath(ath);
        }

        info!("ServicesBootstrap: {} scan pipeline ready", asset_class);
        builder.build()
    }

    /// Alerts go out whenever a webhook is configured, whatever the digest flag says.
    pub fn alert_engine(config: &Config, persistence: &PersistenceHandle) -> AlertEngine {
        AlertEngine::new(
            persistence.price_alert_repository.clone(),
            Arc::new(WebhookNotifier::from_config(&config.notifications)),
            config.alerts.policy(),
        )
    }

    pub fn price_source(config: &Config, asset_class: AssetClass) -> Result<Arc<dyn PriceSource>> {
        match asset_class {
            AssetClass::Crypto => Ok(Arc::new(BinanceMarketDataService::from_config(
                &config.sources,
                &config.scanner.quote_asset,
            ))),
            AssetClass::Stock => Ok(Arc::new(AlpacaMarketDataService::from_config(&config.sources))),
            other => bail!("No price source available for asset class {}", other),
        }
    }

    fn crypto_sources(config: &Config) -> SourceSet {
        let quote = config.scanner.quote_asset.as_str();
        let binance = Arc::new(BinanceMarketDataService::from_config(&config.sources, quote));
        let coingecko = Arc::new(CoinGeckoClient::from_config(
            &config.sources,
            quote,
            config.scanner.near_ath_tolerance,
        ));

        SourceSet {
            universe_primary: coingecko.clone(),
            universe_secondary: Some(binance.clone()),
            bars_primary: binance.clone(),
            bars_secondary: Some(Arc::new(MexcMarketDataService::from_config(&config.sources))),
            ath: Some(AthStage {
                feed: coingecko,
                listing: binance.clone(),
            }),
            prices: binance,
            exclusion: ExclusionFilter::new(&config.scanner.exclude_keywords),
        }
    }

    fn stock_sources(config: &Config) -> SourceSet {
        let fixed_list: Arc<dyn UniverseSource> = Arc::new(StaticUniverse::new(&config.scanner.stock_symbols));
        let alpaca = Arc::new(AlpacaMarketDataService::from_config(&config.sources));
        let yahoo: Arc<dyn BarSource> = Arc::new(YahooChartClient::from_config(&config.sources));

        // Crypto keywords would drop real tickers such as M, so stocks scan unfiltered.
        let exclusion = ExclusionFilter::default();

        if has_alpaca_credentials(&config.sources) {
            SourceSet {
                universe_primary: alpaca.clone(),
                universe_secondary: Some(fixed_list),
                bars_primary: alpaca.clone(),
                bars_secondary: Some(yahoo),
                ath: None,
                prices: alpaca,
                exclusion,
            }
        } else {
            warn!("ServicesBootstrap: Alpaca credentials missing, using the configured stock list and Yahoo bars");
            SourceSet {
                universe_primary: fixed_list,
                universe_secondary: None,
                bars_primary: yahoo,
                bars_secondary: None,
                ath: None,
                prices: alpaca,
                exclusion,
            }
        }
    }
}

fn has_alpaca_credentials(sources: &SourceEnvConfig) -> bool {
    !sources.alpaca_api_key.is_empty() && !sources.alpaca_secret_key.is_empty()
}
