//! Checkout configuration loaded from environment variables.
//!
//! Commerce settings (tax, fees, thresholds) are store data and arrive via
//! [`SettingsProvider`](crate::settings::SettingsProvider). This module only
//! covers deployment concerns: locale policies, gateway credentials and
//! timeouts.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CHECKOUT_CURRENCY_CODE` - ISO 4217 code charged at the gateway (default: INR)
//! - `CHECKOUT_PHONE_DIGITS` - Digits in a valid phone number (default: 10)
//! - `CHECKOUT_PINCODE_DIGITS` - Digits in a valid pincode (default: 6)
//! - `CHECKOUT_GATEWAY_TIMEOUT_SECS` - Payment round-trip limit (default: 120)
//! - `CHECKOUT_ORDER_PREFIX` - Prefix for generated order numbers (default: ORD)
//! - `PAYMENT_GATEWAY_KEY_ID` - Gateway public key id
//! - `PAYMENT_GATEWAY_KEY_SECRET` - Gateway secret (required if the key id is set)
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string, falls back to `DATABASE_URL`

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use threadline_core::CurrencyCode;

use crate::checkout::CheckoutPolicy;

const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ORDER_PREFIX: &str = "ORD";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout deployment configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Currency charged at the payment gateway
    pub currency: CurrencyCode,
    /// Contact and address format rules
    pub policy: CheckoutPolicy,
    /// Upper bound on one payment gateway round-trip
    pub gateway_timeout: Duration,
    /// Prefix for generated order numbers
    pub order_prefix: String,
    /// Payment gateway credentials, if online payments are wired up
    pub gateway: Option<GatewayConfig>,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
}

/// Payment gateway credentials.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Public key id sent to the browser checkout widget
    pub key_id: String,
    /// Server-side secret used to verify payment signatures
    pub key_secret: SecretString,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish()
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::default(),
            policy: CheckoutPolicy::default(),
            gateway_timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
            order_prefix: DEFAULT_ORDER_PREFIX.to_owned(),
            gateway: None,
            database_url: None,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed, or if
    /// the gateway key id is set without its secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let currency = get_env_or_default("CHECKOUT_CURRENCY_CODE", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_CURRENCY_CODE".to_string(), e))?;
        let phone_digits = parse_env_or_default("CHECKOUT_PHONE_DIGITS", "10")?;
        let pincode_digits = parse_env_or_default("CHECKOUT_PINCODE_DIGITS", "6")?;
        let timeout_secs: u64 = parse_env_or_default(
            "CHECKOUT_GATEWAY_TIMEOUT_SECS",
            &DEFAULT_GATEWAY_TIMEOUT_SECS.to_string(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_GATEWAY_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let order_prefix = get_env_or_default("CHECKOUT_ORDER_PREFIX", DEFAULT_ORDER_PREFIX);

        let gateway = GatewayConfig::from_env()?;
        let database_url = get_database_url("CHECKOUT_DATABASE_URL");

        Ok(Self {
            currency,
            policy: CheckoutPolicy {
                phone_digits,
                pincode_digits,
            },
            gateway_timeout: Duration::from_secs(timeout_secs),
            order_prefix,
            gateway,
            database_url,
        })
    }
}

impl CheckoutConfig {
    /// Whether gateway credentials are present, so online payments can be
    /// taken at all.
    #[must_use]
    pub const fn online_payments_configured(&self) -> bool {
        self.gateway.is_some()
    }
}

impl GatewayConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(key_id) = get_optional_env("PAYMENT_GATEWAY_KEY_ID") else {
            return Ok(None);
        };
        let key_secret = get_required_secret("PAYMENT_GATEWAY_KEY_SECRET")?;
        Ok(Some(Self { key_id, key_secret }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::default();
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.policy.phone_digits, 10);
        assert_eq!(config.policy.pincode_digits, 6);
        assert_eq!(config.gateway_timeout, Duration::from_secs(120));
        assert_eq!(config.order_prefix, "ORD");
        assert!(config.gateway.is_none());
        assert!(!config.online_payments_configured());
    }

    #[test]
    fn test_parse_env_or_default_uses_default() {
        let value: usize =
            parse_env_or_default("THREADLINE_TEST_UNSET_VARIABLE_7F3A", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_or_default_reports_key() {
        let result: Result<usize, _> =
            parse_env_or_default("THREADLINE_TEST_UNSET_VARIABLE_7F3B", "ten");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(ref key, _) if key == "THREADLINE_TEST_UNSET_VARIABLE_7F3B"
        ));
    }

    #[test]
    fn test_gateway_config_debug_redacts_secret() {
        let config = GatewayConfig {
            key_id: "rzp_live_public_id".to_string(),
            key_secret: SecretString::from("super_secret_gateway_key"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("rzp_live_public_id"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_gateway_key"));
    }
}
