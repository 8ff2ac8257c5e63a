//! Currency codes and the store's rounding rules.
//!
//! Amounts are carried as [`Decimal`] in the currency's standard unit
//! (rupees, not paise) at full precision. Rounding happens once, when a
//! value is displayed, persisted or handed to a payment gateway, using
//! round-half-up (midpoint away from zero) at two decimal places.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept once an amount is rounded for display or storage.
pub const CURRENCY_DECIMALS: u32 = 2;

/// ISO 4217 currency codes accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// The conventional symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency code: {other}")),
        }
    }
}

/// Error converting an amount to integer minor units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MinorUnitsError {
    /// Gateways never accept negative amounts.
    #[error("amount {0} is negative")]
    Negative(Decimal),
    /// The amount does not fit in an `i64` of minor units.
    #[error("amount {0} is too large")]
    Overflow(Decimal),
}

/// Round an amount half-up to two decimal places.
///
/// The result always carries a scale of two so it prints as `1330.00`.
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_DECIMALS);
    rounded
}

/// Convert an amount to the smallest currency unit (paise, cents).
///
/// # Errors
///
/// Returns [`MinorUnitsError`] when the amount is negative or overflows `i64`.
pub fn to_minor_units(value: Decimal) -> Result<i64, MinorUnitsError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(MinorUnitsError::Negative(value));
    }
    let minor = round_currency(value)
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MinorUnitsError::Overflow(value))?;
    minor.to_i64().ok_or(MinorUnitsError::Overflow(value))
}

/// Render an amount with a currency symbol, e.g. `₹1330.00`.
#[must_use]
pub fn format_amount(symbol: &str, value: Decimal) -> String {
    format!("{symbol}{}", round_currency(value))
}
