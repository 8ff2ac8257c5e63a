//! Store-wide commerce settings.
//!
//! The settings collaborator hands over a loose key-value snapshot (numbers,
//! numeric strings, booleans). [`CommerceSettings::resolve`] is the one place
//! where that snapshot is coerced and defaulted into a typed value; nothing
//! else in the crate reads raw settings keys.
//!
//! | key                       | type    | default when absent            |
//! |---------------------------|---------|--------------------------------|
//! | `tax_rate`                | percent | 0                              |
//! | `delivery_charge`         | amount  | 0                              |
//! | `free_delivery_threshold` | amount  | 0 (no free-delivery offer)     |
//! | `cod_enabled`             | bool    | false                          |
//! | `cod_charge`              | amount  | 0                              |
//! | `cod_threshold`           | amount  | no ceiling                     |
//! | `min_order_amount`        | amount  | 0                              |
//! | `max_order_amount`        | amount  | 0 (no ceiling)                 |
//! | `online_payment_enabled`  | bool    | true                           |
//! | `currency_symbol`         | string  | `₹`                            |

use std::collections::HashMap;
use std::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::store::StoreError;

/// Raw settings as delivered by the settings collaborator.
pub type SettingsSnapshot = HashMap<String, Value>;

/// Errors resolving a settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("settings source unavailable: {0}")]
    Unavailable(#[from] StoreError),
    #[error("setting {key} has invalid value {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("setting {key} must not be negative")]
    Negative { key: &'static str },
}

/// Source of the commerce settings snapshot.
pub trait SettingsProvider {
    /// Fetch the current settings as a key-value snapshot.
    fn fetch(&self) -> impl Future<Output = Result<SettingsSnapshot, StoreError>> + Send;
}

/// Typed snapshot of the store's commerce configuration.
///
/// Immutable for the duration of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommerceSettings {
    /// Tax as a percentage of the subtotal.
    pub tax_rate: Decimal,
    /// Flat delivery fee.
    pub delivery_charge: Decimal,
    /// Subtotal at which delivery becomes free. Zero or less disables the offer.
    pub free_delivery_threshold: Decimal,
    /// Whether Cash on Delivery is offered at all.
    pub cod_enabled: bool,
    /// Flat surcharge for COD orders.
    pub cod_charge: Decimal,
    /// Largest order total eligible for COD.
    pub cod_threshold: Decimal,
    /// Smallest subtotal that can be ordered.
    pub min_order_amount: Decimal,
    /// Largest total that can be ordered. Zero or less means no ceiling.
    pub max_order_amount: Decimal,
    /// Whether the online payment gateway is switched on.
    pub online_payment_enabled: bool,
    /// Symbol used when formatting amounts for customers.
    pub currency_symbol: String,
}

impl Default for CommerceSettings {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::ZERO,
            delivery_charge: Decimal::ZERO,
            free_delivery_threshold: Decimal::ZERO,
            cod_enabled: false,
            cod_charge: Decimal::ZERO,
            cod_threshold: Decimal::MAX,
            min_order_amount: Decimal::ZERO,
            max_order_amount: Decimal::ZERO,
            online_payment_enabled: true,
            currency_symbol: "₹".to_owned(),
        }
    }
}

impl CommerceSettings {
    /// Resolve a raw snapshot into typed settings.
    ///
    /// Missing keys, `null` and blank strings take the documented default.
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] for values that cannot be read
    /// as the expected type and [`SettingsError::Negative`] for negative
    /// rates, fees and minimums.
    pub fn resolve(snapshot: &SettingsSnapshot) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let settings = Self {
            tax_rate: non_negative(snapshot, "tax_rate", defaults.tax_rate)?,
            delivery_charge: non_negative(snapshot, "delivery_charge", defaults.delivery_charge)?,
            free_delivery_threshold: decimal(
                snapshot,
                "free_delivery_threshold",
                defaults.free_delivery_threshold,
            )?,
            cod_enabled: boolean(snapshot, "cod_enabled", defaults.cod_enabled)?,
            cod_charge: non_negative(snapshot, "cod_charge", defaults.cod_charge)?,
            cod_threshold: decimal(snapshot, "cod_threshold", defaults.cod_threshold)?,
            min_order_amount: non_negative(
                snapshot,
                "min_order_amount",
                defaults.min_order_amount,
            )?,
            max_order_amount: decimal(snapshot, "max_order_amount", defaults.max_order_amount)?,
            online_payment_enabled: boolean(
                snapshot,
                "online_payment_enabled",
                defaults.online_payment_enabled,
            )?,
            currency_symbol: text(snapshot, "currency_symbol", &defaults.currency_symbol),
        };

        debug!(?settings, "resolved commerce settings");
        Ok(settings)
    }

    /// Whether cash on delivery is capped by order total.
    #[must_use]
    pub fn has_cod_threshold(&self) -> bool {
        self.cod_threshold > Decimal::ZERO
    }

    /// Whether the store caps order totals.
    #[must_use]
    pub fn has_max_order_amount(&self) -> bool {
        self.max_order_amount > Decimal::ZERO
    }
}

/// Fetch a snapshot from `provider` and resolve it.
///
/// # Errors
///
/// Returns [`SettingsError::Unavailable`] if the fetch fails, or a resolution
/// error if the snapshot is malformed.
pub async fn load_settings<P: SettingsProvider>(
    provider: &P,
) -> Result<CommerceSettings, SettingsError> {
    let snapshot = provider.fetch().await?;
    CommerceSettings::resolve(&snapshot)
}

/// Look up a key, treating `null` and blank strings as absent.
fn lookup<'a>(snapshot: &'a SettingsSnapshot, key: &str) -> Option<&'a Value> {
    match snapshot.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    }
}

fn decimal(
    snapshot: &SettingsSnapshot,
    key: &'static str,
    default: Decimal,
) -> Result<Decimal, SettingsError> {
    let Some(value) = lookup(snapshot, key) else {
        return Ok(default);
    };
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| SettingsError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn non_negative(
    snapshot: &SettingsSnapshot,
    key: &'static str,
    default: Decimal,
) -> Result<Decimal, SettingsError> {
    let value = decimal(snapshot, key, default)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(SettingsError::Negative { key });
    }
    Ok(value)
}

fn boolean(
    snapshot: &SettingsSnapshot,
    key: &'static str,
    default: bool,
) -> Result<bool, SettingsError> {
    let Some(value) = lookup(snapshot, key) else {
        return Ok(default);
    };
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| SettingsError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn text(snapshot: &SettingsSnapshot, key: &str, default: &str) -> String {
    match lookup(snapshot, key) {
        Some(Value::String(s)) => s.trim().to_owned(),
        _ => default.to_owned(),
    }
}
