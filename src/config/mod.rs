//! Configuration module for peakwatch.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by domain: Database, Notifications, Scanner, Alerts and Sources.
//!
//! The configuration is built once at start-up and passed by value into every
//! component. Loading fails fast on a missing or invalid parameter, before any
//! network activity.

mod alert_config;
mod database_config;
mod notification_config;
mod scanner_config;
mod source_config;

pub use alert_config::AlertEnvConfig;
pub use database_config::DatabaseEnvConfig;
pub use notification_config::NotificationEnvConfig;
pub use scanner_config::{DEFAULT_EXCLUDE_KEYWORDS, DEFAULT_STOCK_SYMBOLS, ScannerEnvConfig};
pub use source_config::{RetryPolicy, SourceEnvConfig};

use crate::domain::errors::ConfigError;
use std::fmt::Display;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseEnvConfig,
    pub notifications: NotificationEnvConfig,
    pub scanner: ScannerEnvConfig,
    pub alerts: AlertEnvConfig,
    pub sources: SourceEnvConfig,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvLookup::new(&lookup);

        Ok(Self {
            database: DatabaseEnvConfig::load(&env)?,
            notifications: NotificationEnvConfig::load(&env)?,
            scanner: ScannerEnvConfig::load(&env)?,
            alerts: AlertEnvConfig::load(&env)?,
            sources: SourceEnvConfig::load(&env)?,
        })
    }
}

/// Typed accessors over a key lookup. Blank values count as unset.
pub(crate) struct EnvLookup<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvLookup<'a> {
    pub(crate) fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    pub(crate) fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing { key })
    }

    pub(crate) fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    pub(crate) fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key,
                    value: raw,
                    reason: "expected a boolean".to_string(),
                }),
            },
        }
    }

    /// Comma-separated list; entries are trimmed and blanks dropped.
    pub(crate) fn list_or(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.get(key) {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Rejects values outside `(0, 1]`.
pub(crate) fn ensure_unit_fraction(
    key: &'static str,
    value: rust_decimal::Decimal,
) -> Result<rust_decimal::Decimal, ConfigError> {
    if value <= rust_decimal::Decimal::ZERO || value > rust_decimal::Decimal::ONE {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be in (0, 1]".to_string(),
        });
    }
    Ok(value)
}

pub(crate) fn ensure_at_least(key: &'static str, value: u64, min: u64) -> Result<u64, ConfigError> {
    if value < min {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be at least {}", min),
        });
    }
    Ok(value)
}

pub(crate) fn ensure_within(key: &'static str, value: u64, min: u64, max: u64) -> Result<u64, ConfigError> {
    ensure_at_least(key, value, min)?;
    if value > max {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be at most {}", max),
        });
    }
    Ok(value)
}
