//! Per-step validation gates.
//!
//! Each gate checks only its own slice of the draft and reports the first
//! problem it finds. The same gates run on forward navigation and again at
//! placement.

use serde::{Deserialize, Serialize};
use threadline_core::{Email, PaymentMethod, Phone, Pincode, PincodeError, format_amount};

use super::draft::{AddressDetails, CustomerInfo};
use crate::error::ValidationError;
use crate::pricing::PricedOrder;
use crate::settings::CommerceSettings;

/// Locale rules for contact and address fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    /// Digits in a valid phone number.
    pub phone_digits: usize,
    /// Digits in a valid postal code.
    pub pincode_digits: usize,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            phone_digits: 10,
            pincode_digits: 6,
        }
    }
}

/// Contact details that passed the contact gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
}

/// Contact gate: name, email and phone are present and well-formed.
///
/// # Errors
///
/// Returns the first missing or malformed field.
pub fn validate_contact(
    customer: &CustomerInfo,
    policy: &CheckoutPolicy,
) -> Result<ValidContact, ValidationError> {
    let name = required(&customer.name, "Full name")?;
    let email = Email::parse(&customer.email)?;
    let phone = Phone::parse(&customer.phone, policy.phone_digits)?;
    Ok(ValidContact {
        name: name.to_owned(),
        email,
        phone,
    })
}

/// Address gate.
///
/// City, state and pincode are always required. A newly entered address also
/// needs a plot number, a street and a pincode of the right length; a saved
/// address was checked when it was saved, so those are skipped.
///
/// # Errors
///
/// Returns the first missing or malformed field.
pub fn validate_address(
    address: &AddressDetails,
    policy: &CheckoutPolicy,
) -> Result<(), ValidationError> {
    if !address.is_saved() {
        required(&address.plot_number, "Plot / house number")?;
        required(&address.street, "Street")?;
    }
    required(&address.city, "City")?;
    required(&address.state, "State")?;

    if address.pincode.trim().is_empty() {
        return Err(PincodeError::Empty.into());
    }
    if !address.is_saved() {
        Pincode::parse(&address.pincode, policy.pincode_digits)?;
    }
    Ok(())
}

/// Payment gate: the chosen method is switched on and, for Cash on
/// Delivery, the total is within the COD ceiling.
///
/// # Errors
///
/// Returns why the method can't be used for this order.
pub fn validate_payment_method(
    method: PaymentMethod,
    priced: &PricedOrder,
    settings: &CommerceSettings,
) -> Result<(), ValidationError> {
    match method {
        PaymentMethod::Online if !settings.online_payment_enabled => {
            Err(ValidationError::OnlinePaymentUnavailable)
        }
        PaymentMethod::Online => Ok(()),
        PaymentMethod::Cod if !settings.cod_enabled => Err(ValidationError::CodUnavailable),
        PaymentMethod::Cod if !priced.within_cod_threshold(settings) => {
            Err(ValidationError::CodAboveThreshold {
                threshold: format_amount(&settings.currency_symbol, settings.cod_threshold),
            })
        }
        PaymentMethod::Cod => Ok(()),
    }
}

/// Order-amount guard run on every forward move and at placement.
///
/// # Errors
///
/// Returns [`ValidationError::MinimumOrderNotMet`] with the shortfall, or
/// [`ValidationError::MaximumOrderExceeded`] when the store caps totals.
pub fn validate_order_amount(
    priced: &PricedOrder,
    settings: &CommerceSettings,
) -> Result<(), ValidationError> {
    let symbol = &settings.currency_symbol;
    if !priced.is_min_order_met {
        return Err(ValidationError::MinimumOrderNotMet {
            minimum: format_amount(symbol, settings.min_order_amount),
            shortfall: format_amount(symbol, priced.min_order_shortfall),
        });
    }
    if priced.exceeds_max_order(settings) {
        return Err(ValidationError::MaximumOrderExceeded {
            maximum: format_amount(symbol, settings.max_order_amount),
        });
    }
    Ok(())
}

fn required<'a>(value: &'a str, label: &'static str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField(label))
    } else {
        Ok(value)
    }
}
