//! Database configuration parsing from environment variables.

use super::{EnvLookup, ensure_at_least};
use crate::domain::errors::ConfigError;

/// Relational store connection parameters
#[derive(Debug, Clone)]
pub struct DatabaseEnvConfig {
    /// sqlx connection URL, e.g. `sqlite://data/peakwatch.db`
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseEnvConfig {
    pub(crate) fn load(env: &EnvLookup<'_>) -> Result<Self, ConfigError> {
        let url = env.required("DATABASE_URL")?;
        let max_connections = env.parse_or::<u32>("DATABASE_MAX_CONNECTIONS", 5)?;
        ensure_at_least("DATABASE_MAX_CONNECTIONS", u64::from(max_connections), 1)?;

        Ok(Self {
            url,
            max_connections,
        })
    }
}
