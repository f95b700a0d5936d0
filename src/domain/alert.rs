//! Price alert evaluation.
//!
//! An alert becomes eligible once the live price reaches `alert_price * tolerance`.
//! There is no upper bound: a price far above the target stays eligible and is
//! only throttled by the cooldown window.

use crate::domain::market::{AssetClass, Symbol};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Persisted alert row. Only `last_notified_at` is ever written by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: i64,
    pub asset_type: AssetClass,
    pub symbol: Symbol,
    pub alert_price: Decimal,
    pub is_active: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// Alert definition as created by the management surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPriceAlert {
    pub asset_type: AssetClass,
    pub symbol: Symbol,
    pub alert_price: Decimal,
    pub is_active: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub tolerance: Decimal,
    pub cooldown: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(95, 2),
            cooldown: Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Price below the trigger level.
    Idle,
    /// Eligible, but notified less than one cooldown ago.
    Suppressed { next_allowed_at: DateTime<Utc> },
    /// Eligible and outside the cooldown window.
    Notify,
}

impl AlertPolicy {
    pub fn trigger_price(&self, alert_price: Decimal) -> Decimal {
        alert_price * self.tolerance
    }

    pub fn is_eligible(&self, alert_price: Decimal, current_price: Decimal) -> bool {
        current_price >= self.trigger_price(alert_price)
    }

    pub fn decide(&self, alert: &PriceAlert, current_price: Decimal, now: DateTime<Utc>) -> AlertDecision {
        if !alert.is_active || !self.is_eligible(alert.alert_price, current_price) {
            return AlertDecision::Idle;
        }

        match alert.last_notified_at {
            Some(last) if now - last < self.cooldown => AlertDecision::Suppressed {
                next_allowed_at: last + self.cooldown,
            },
            _ => AlertDecision::Notify,
        }
    }
}

/// Human-readable alert message.
pub fn format_alert_message(alert: &PriceAlert, current_price: Decimal, now: DateTime<Utc>) -> String {
    let change = current_price
        .checked_sub(alert.alert_price)
        .and_then(|delta| delta.checked_div(alert.alert_price))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .map(|pct| format!(" ({:+.2}%)", pct))
        .unwrap_or_default();
    let emoji = if current_price < alert.alert_price {
        "🔔"
    } else {
        "🚀"
    };

    format!(
        "{emoji} *Price Alert Triggered!*\n\
         Asset: *{symbol}* ({asset})\n\
         Alert Price: *${alert_price}*\n\
         Current Price: *${current_price}*{change}\n\
         Time: {time}",
        symbol = alert.symbol,
        asset = alert.asset_type.as_str().to_uppercase(),
        alert_price = alert.alert_price.round_dp(2),
        current_price = current_price.round_dp(2),
        time = now.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn alert(price: &str, last_notified_at: Option<DateTime<Utc>>) -> PriceAlert {
        PriceAlert {
            id: 1,
            asset_type: AssetClass::Crypto,
            symbol: Symbol::new("BTCUSDT").unwrap(),
            alert_price: Decimal::from_str(price).unwrap(),
            is_active: true,
            last_notified_at,
        }
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_threshold_boundary() {
        let policy = AlertPolicy::default();
        let now = Utc::now();
        let a = alert("100", None);

        assert_eq!(policy.decide(&a, d("95"), now), AlertDecision::Notify);
        assert_eq!(policy.decide(&a, d("94.99"), now), AlertDecision::Idle);
    }

    #[test]
    fn test_no_upper_bound() {
        let policy = AlertPolicy::default();
        let a = alert("100", None);
        assert_eq!(policy.decide(&a, d("1000000"), Utc::now()), AlertDecision::Notify);
    }

    #[test]
    fn test_cooldown_window() {
        let policy = AlertPolicy::default();
        let now = Utc::now();

        let recent = alert("100", Some(now - Duration::minutes(30)));
        assert!(matches!(
            policy.decide(&recent, d("101"), now),
            AlertDecision::Suppressed { .. }
        ));

        let stale = alert("100", Some(now - Duration::minutes(61)));
        assert_eq!(policy.decide(&stale, d("101"), now), AlertDecision::Notify);

        let exactly = alert("100", Some(now - Duration::hours(1)));
        assert_eq!(policy.decide(&exactly, d("101"), now), AlertDecision::Notify);
    }

    #[test]
    fn test_inactive_alert_is_idle() {
        let policy = AlertPolicy::default();
        let mut a = alert("100", None);
        a.is_active = false;
        assert_eq!(policy.decide(&a, d("150"), Utc::now()), AlertDecision::Idle);
    }

    #[test]
    fn test_message_format() {
        let now = Utc::now();
        let below = format_alert_message(&alert("100", None), d("96"), now);
        assert!(below.starts_with("🔔"));
        assert!(below.contains("BTCUSDT"));
        assert!(below.contains("(CRYPTO)"));
        assert!(below.contains("-4.00%"));

        let above = format_alert_message(&alert("100", None), d("110"), now);
        assert!(above.starts_with("🚀"));
        assert!(above.contains("+10.00%"));
    }

    #[test]
    fn test_message_omits_change_when_it_overflows() {
        let mut tiny = alert("1", None);
        tiny.alert_price = Decimal::new(1, 28);
        let text = format_alert_message(&tiny, Decimal::MAX, Utc::now());
        assert!(text.contains("*BTCUSDT*"));
        assert!(!text.contains('%'));

        let zero = alert("0", None);
        let text = format_alert_message(&zero, d("5"), Utc::now());
        assert!(text.contains("Current Price: *$5*\n"));
    }
}
