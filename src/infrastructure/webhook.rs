//! Incoming-webhook notifier (Slack-compatible `{"text": ...}` body).

use crate::config::NotificationEnvConfig;
use crate::domain::errors::NotificationError;
use crate::domain::ports::NotificationSink;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts messages to a webhook URL. Not retried: every send is advisory.
pub struct WebhookNotifier {
    client: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, url }
    }

    pub fn from_config(config: &NotificationEnvConfig) -> Self {
        Self::new(config.webhook_url.clone(), config.timeout)
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn send(&self, text: &str) -> Result<(), NotificationError> {
        let url = self.url.as_deref().ok_or(NotificationError::NotConfigured)?;

        let response = self
            .client
            .post(url)
            .json(&WebhookMessage { text })
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Status {
                status: status.as_u16(),
            });
        }

        debug!("WebhookNotifier: Delivered {} chars", text.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_url_is_not_configured() {
        let notifier = WebhookNotifier::new(None, Duration::from_secs(1));
        assert!(!notifier.is_configured());
        assert!(matches!(
            notifier.send("hello").await,
            Err(NotificationError::NotConfigured)
        ));
    }

    #[test]
    fn test_message_body_shape() {
        let body = serde_json::to_value(WebhookMessage { text: "hi" }).unwrap();
        assert_eq!(body, serde_json::json!({"text": "hi"}));
    }
}
