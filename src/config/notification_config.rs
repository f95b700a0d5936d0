//! Webhook notification configuration parsing from environment variables.

use super::{EnvLookup, ensure_at_least};
use crate::domain::errors::ConfigError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NotificationEnvConfig {
    pub webhook_url: Option<String>,
    /// Gates the watchlist digest only; price alerts go out whenever a URL is set.
    pub enabled: bool,
    /// Maximum symbols listed per digest section.
    pub digest_max_items: usize,
    pub timeout: Duration,
}

impl Default for NotificationEnvConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            enabled: false,
            digest_max_items: 30,
            timeout: Duration::from_secs(10),
        }
    }
}

impl NotificationEnvConfig {
    pub(crate) fn load(env: &EnvLookup<'_>) -> Result<Self, ConfigError> {
        let digest_max_items = env.parse_or::<usize>("DIGEST_MAX_ITEMS", 30)?;
        ensure_at_least("DIGEST_MAX_ITEMS", digest_max_items as u64, 1)?;
        let timeout_secs = env.parse_or::<u64>("WEBHOOK_TIMEOUT_SECS", 10)?;
        ensure_at_least("WEBHOOK_TIMEOUT_SECS", timeout_secs, 1)?;

        Ok(Self {
            webhook_url: env.get("SLACK_WEBHOOK_URL"),
            enabled: env.bool_or("SLACK_NOTIFICATIONS_ENABLED", false)?,
            digest_max_items,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
