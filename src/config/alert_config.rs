//! Price alert configuration parsing from environment variables.

use super::{EnvLookup, ensure_unit_fraction, ensure_within};
use crate::domain::alert::AlertPolicy;
use crate::domain::errors::ConfigError;
use rust_decimal::Decimal;

/// One year.
const MAX_COOLDOWN_MINUTES: u64 = 525_600;

#[derive(Debug, Clone)]
pub struct AlertEnvConfig {
    /// Fraction of `alert_price` at which an alert becomes eligible.
    pub tolerance: Decimal,
    pub cooldown: chrono::Duration,
}

impl Default for AlertEnvConfig {
    fn default() -> Self {
        let policy = AlertPolicy::default();
        Self {
            tolerance: policy.tolerance,
            cooldown: policy.cooldown,
        }
    }
}

impl AlertEnvConfig {
    pub(crate) fn load(env: &EnvLookup<'_>) -> Result<Self, ConfigError> {
        let tolerance = ensure_unit_fraction(
            "ALERT_TOLERANCE",
            env.parse_or::<Decimal>("ALERT_TOLERANCE", Decimal::new(95, 2))?,
        )?;
        let cooldown_minutes = env.parse_or::<u64>("ALERT_COOLDOWN_MINUTES", 60)?;
        ensure_within("ALERT_COOLDOWN_MINUTES", cooldown_minutes, 1, MAX_COOLDOWN_MINUTES)?;
        let cooldown = i64::try_from(cooldown_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| ConfigError::Invalid {
                key: "ALERT_COOLDOWN_MINUTES",
                value: cooldown_minutes.to_string(),
                reason: "out of range".to_string(),
            })?;

        Ok(Self { tolerance, cooldown })
    }

    pub fn policy(&self) -> AlertPolicy {
        AlertPolicy {
            tolerance: self.tolerance,
            cooldown: self.cooldown,
        }
    }
}
