//! Best-effort watchlist digest.

use crate::domain::market::AssetClass;
use crate::domain::ports::NotificationSink;
use crate::domain::signal::CandidateSignal;
use std::sync::Arc;
use tracing::{info, warn};

/// Renders the digest, or `None` for an empty set.
///
/// Each section lists at most `max_items` symbols and summarizes the rest.
pub fn build_digest(asset_class: AssetClass, signals: &[CandidateSignal], max_items: usize) -> Option<String> {
    if signals.is_empty() {
        return None;
    }

    let (ath, near_high): (Vec<&CandidateSignal>, Vec<&CandidateSignal>) = signals.iter().partition(|s| s.is_ath);

    let label = match asset_class {
        AssetClass::Crypto => "Cryptos",
        AssetClass::Stock => "Stocks",
        AssetClass::Forex => "Forex Pairs",
        AssetClass::Gold | AssetClass::Silver => "Metals",
    };

    let mut message = format!("🚀 *Potential {} Detected ({} symbols)*\n", label, signals.len());
    push_section(&mut message, "Near ATH", &ath, max_items);
    push_section(&mut message, "Near 52-Week High", &near_high, max_items);
    Some(message)
}

fn push_section(message: &mut String, title: &str, signals: &[&CandidateSignal], max_items: usize) {
    if signals.is_empty() {
        return;
    }

    message.push_str(&format!("\n*{} ({}):*\n", title, signals.len()));
    let lines: Vec<String> = signals
        .iter()
        .take(max_items)
        .map(|s| format!("• {}", s.symbol))
        .collect();
    message.push_str(&lines.join("\n"));

    if signals.len() > max_items {
        message.push_str(&format!("\n… and {} more", signals.len() - max_items));
    }
}

pub struct DigestNotifier {
    sink: Arc<dyn NotificationSink>,
    enabled: bool,
    max_items: usize,
}

impl DigestNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>, enabled: bool, max_items: usize) -> Self {
        Self {
            sink,
            enabled,
            max_items: max_items.max(1),
        }
    }

    /// Returns whether a digest was delivered. Never fails the caller.
    pub async fn publish(&self, asset_class: AssetClass, signals: &[CandidateSignal]) -> bool {
        if !self.enabled {
            info!("DigestNotifier: Notifications disabled, skipping digest");
            return false;
        }
        let Some(message) = build_digest(asset_class, signals, self.max_items) else {
            info!("DigestNotifier: No {} signals to report", asset_class);
            return false;
        };

        match self.sink.send(&message).await {
            Ok(()) => {
                info!("DigestNotifier: Digest sent ({} symbols)", signals.len());
                true
            }
            Err(e) => {
                warn!("DigestNotifier: Failed to send digest: {}", e);
                false
            }
        }
    }
}
