use thiserror::Error;

/// Errors raised by market-data source adapters.
///
/// Transient errors (timeouts, transport, non-2xx) and data-shape errors are
/// both contained by the caller: they trigger the fallback adapter or skip the
/// symbol, never abort a run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name}: request timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    #[error("{source_name}: transport error: {reason}")]
    Transport { source_name: String, reason: String },

    #[error("{source_name}: HTTP {status}: {body}")]
    Status {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("{source_name}: malformed payload: {reason}")]
    DataShape { source_name: String, reason: String },

    #[error("{source_name}: no data for {what}")]
    Empty { source_name: String, what: String },

    #[error("{source_name}: operation not supported: {operation}")]
    Unsupported {
        source_name: String,
        operation: &'static str,
    },
}

impl SourceError {
    pub fn data_shape(source_name: &str, reason: impl Into<String>) -> Self {
        SourceError::DataShape {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn empty(source_name: &str, what: impl Into<String>) -> Self {
        SourceError::Empty {
            source_name: source_name.to_string(),
            what: what.into(),
        }
    }
}

/// Relational store failures. A failed watchlist replace is rolled back.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Corrupt {table} row: {reason}")]
    CorruptRow { table: &'static str, reason: String },
}

impl PersistenceError {
    pub fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| PersistenceError::Database { operation, source }
    }
}

/// Outbound webhook failures. Always advisory.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("No webhook URL configured")]
    NotConfigured,

    #[error("Webhook transport error: {0}")]
    Transport(String),

    #[error("Webhook returned HTTP {status}")]
    Status { status: u16 },
}

/// Invalid or missing configuration. Fatal before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    Missing { key: &'static str },

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
