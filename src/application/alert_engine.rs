use crate::domain::alert::{AlertDecision, AlertPolicy, format_alert_message};
use crate::domain::market::{AssetClass, Symbol};
use crate::domain::ports::{NotificationSink, PriceSource};
use crate::domain::repositories::PriceAlertRepository;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Compares live prices with stored alert thresholds and sends throttled notifications.
pub struct AlertEngine {
    repository: Arc<dyn PriceAlertRepository>,
    sink: Arc<dyn NotificationSink>,
    policy: AlertPolicy,
}

impl AlertEngine {
    pub fn new(repository: Arc<dyn PriceAlertRepository>, sink: Arc<dyn NotificationSink>, policy: AlertPolicy) -> Self {
        Self {
            repository,
            sink,
            policy,
        }
    }

    pub async fn check(&self, asset_type: AssetClass, prices: &HashMap<Symbol, Decimal>) -> usize {
        self.check_at(asset_type, prices, Utc::now()).await
    }

    /// Returns the number of notifications actually delivered.
    pub async fn check_at(
        &self,
        asset_type: AssetClass,
        prices: &HashMap<Symbol, Decimal>,
        now: DateTime<Utc>,
    ) -> usize {
        // Deterministic order keeps the outbound messages stable between runs.
        let mut symbols: Vec<(&Symbol, &Decimal)> = prices.iter().collect();
        symbols.sort_by(|a, b| a.0.cmp(b.0));

        let mut sent = 0;
        for (symbol, price) in symbols {
            if *price <= Decimal::ZERO {
                debug!("AlertEngine: Skipping {} with non-positive price {}", symbol, price);
                continue;
            }
            sent += self.check_symbol(asset_type, symbol, *price, now).await;
        }

        if sent > 0 {
            info!("AlertEngine: Sent {} {} price alerts", sent, asset_type);
        }
        sent
    }

    async fn check_symbol(&self, asset_type: AssetClass, symbol: &Symbol, price: Decimal, now: DateTime<Utc>) -> usize {
        let alerts = match self.repository.find_active(asset_type, symbol).await {
            Ok(alerts) => alerts,
            Err(e) => {
                error!("AlertEngine: Failed to load alerts for {}: {}", symbol, e);
                return 0;
            }
        };

        let mut sent = 0;
        for alert in alerts {
            match self.policy.decide(&alert, price, now) {
                AlertDecision::Idle => {}
                AlertDecision::Suppressed { next_allowed_at } => {
                    debug!(
                        "AlertEngine: Alert {} for {} in cooldown until {}",
                        alert.id, symbol, next_allowed_at
                    );
                }
                AlertDecision::Notify => {
                    let message = format_alert_message(&alert, price, now);
                    if let Err(e) = self.sink.send(&message).await {
                        warn!("AlertEngine: Failed to deliver alert {} for {}: {}", alert.id, symbol, e);
                        continue;
                    }
                    sent += 1;
                    if let Err(e) = self.repository.mark_notified(alert.id, now).await {
                        error!(
                            "AlertEngine: Alert {} sent but last_notified_at not updated: {}",
                            alert.id, e
                        );
                    }
                }
            }
        }
        sent
    }

    /// Checks every symbol that has an active alert, pricing them through `prices`.
    pub async fn check_active(&self, asset_type: AssetClass, prices: &dyn PriceSource) -> anyhow::Result<usize> {
        let symbols = self.repository.active_symbols(asset_type).await?;
        if symbols.is_empty() {
            info!("AlertEngine: No active {} alerts", asset_type);
            return Ok(0);
        }

        info!(
            "AlertEngine: Checking {} {} symbols with active alerts via {}",
            symbols.len(),
            asset_type,
            prices.name()
        );
        let quotes = prices.latest_prices(&symbols).await?;
        for symbol in symbols.iter().filter(|s| !quotes.contains_key(*s)) {
            warn!("AlertEngine: No price for {}", symbol);
        }

        Ok(self.check(asset_type, &quotes).await)
    }
}
