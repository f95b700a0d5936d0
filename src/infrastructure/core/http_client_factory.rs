use crate::config::RetryPolicy;
use crate::domain::errors::SourceError;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a source-adapter HTTP client with the shared retry middleware.
    ///
    /// `timeout` bounds each individual attempt; callers bound the whole
    /// retried call with their own deadline.
    pub fn create_client(policy: &RetryPolicy, timeout: Duration) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(policy.min_backoff, policy.max_backoff)
            .build_with_max_retries(policy.max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("peakwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Builds `base_url` + `path` with an encoded query string.
///
/// reqwest-middleware does not expose `.query()`, so the query is baked into the URL.
pub fn build_url<K, V>(
    source_name: &str,
    base_url: &str,
    path: &str,
    params: &[(K, V)],
) -> Result<Url, SourceError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| SourceError::Transport {
        source_name: source_name.to_string(),
        reason: format!("invalid URL {}: {}", raw, e),
    })?;
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    }
    Ok(url)
}

/// GET `url` and deserialize the body into `T`, retries included, within `deadline`.
///
/// Timeouts, transport failures and non-2xx statuses are transient; a body
/// that does not match `T` is a data-shape error.
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    source_name: &str,
    url: Url,
    headers: &[(&str, &str)],
    deadline: Duration,
) -> Result<T, SourceError> {
    match tokio::time::timeout(deadline, fetch_json(client, source_name, url, headers)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            source_name: source_name.to_string(),
            timeout_ms: deadline.as_millis() as u64,
        }),
    }
}

async fn fetch_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    source_name: &str,
    url: Url,
    headers: &[(&str, &str)],
) -> Result<T, SourceError> {
    debug!("{}: GET {}", source_name, url.path());

    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.send().await.map_err(|e| SourceError::Transport {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| SourceError::Transport {
        source_name: source_name.to_string(),
        reason: format!("failed to read body: {}", e),
    })?;

    if !status.is_success() {
        return Err(SourceError::Status {
            source_name: source_name.to_string(),
            status: status.as_u16(),
            body: truncate(&body, 200),
        });
    }

    serde_json::from_str::<T>(&body).map_err(|e| SourceError::data_shape(source_name, e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_query() {
        let url = build_url(
            "Binance",
            "https://api.binance.com/",
            "/api/v3/ticker/price",
            &[("symbols", "[\"BTCUSDT\",\"ETHUSDT\"]")],
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("api.binance.com"));
        assert_eq!(url.path(), "/api/v3/ticker/price");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "symbols");
        assert_eq!(value, "[\"BTCUSDT\",\"ETHUSDT\"]");
    }

    #[test]
    fn test_build_url_without_params() {
        let url = build_url::<&str, &str>("CoinGecko", "https://api.coingecko.com", "/api/v3/ping", &[])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.coingecko.com/api/v3/ping");
    }
}
