//! Payment gateway contract.
//!
//! Only the request/response shape is defined here. The gateway itself (a
//! hosted checkout widget plus its server API) is an external collaborator.

use std::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use threadline_core::{CurrencyCode, Email, Phone};

use crate::order::OrderNumber;

/// Customer details prefilled in the gateway's payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCustomer {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
}

/// A request to collect payment for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in minor units (paise for INR).
    pub amount: i64,
    pub currency: CurrencyCode,
    pub order_number: OrderNumber,
    pub customer: PaymentCustomer,
}

/// Gateway identifiers proving a payment succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
}

/// A successful payment held by a session until its order is stored.
///
/// The charge is only good for the order number and minor-unit amount it was
/// collected under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedPayment {
    pub order_number: OrderNumber,
    /// Rounded total the customer paid.
    pub total: Decimal,
    /// The same amount in minor units, as sent to the gateway.
    pub amount: i64,
    pub confirmation: PaymentConfirmation,
}

impl CollectedPayment {
    /// Whether this payment pays for `order_number` at exactly `amount`.
    #[must_use]
    pub fn covers(&self, order_number: &OrderNumber, amount: i64) -> bool {
        &self.order_number == order_number && self.amount == amount
    }
}

/// How a payment attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded(PaymentConfirmation),
    /// The gateway declined the payment.
    Failed { reason: String },
    /// The customer closed the payment form.
    Cancelled { reason: String },
}

/// The gateway could not be reached or answered nonsense.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payment gateway error: {0}")]
pub struct GatewayError(pub String);

/// Collects payment for an order.
pub trait PaymentGateway {
    /// Run one payment round-trip.
    ///
    /// Declines and cancellations are ordinary outcomes; `Err` is reserved for
    /// transport and protocol failures.
    fn collect(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentOutcome, GatewayError>> + Send;
}
