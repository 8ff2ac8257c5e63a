//! Checkout error taxonomy.
//!
//! Every failure a checkout can hit falls into one of three groups:
//!
//! - [`ValidationError`] - the customer can fix it (missing field, coupon
//!   rejected, minimum order not met). Resolved at the failing step.
//! - [`StateError`] - an illegal transition. The session refuses it outright.
//! - [`ExternalFailure`] - settings, store or gateway trouble. The draft stays
//!   intact and the customer can resubmit.
//!
//! [`CheckoutError`] wraps all three and provides [`CheckoutError::user_message`]
//! for the text shown to the customer.

use thiserror::Error;

use threadline_core::{EmailError, MinorUnitsError, PhoneError, PincodeError};

use crate::checkout::CheckoutStep;
use crate::coupon::CouponRejection;

/// Message shown for failures the customer can't act on beyond retrying.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again";

/// A problem the customer can correct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Your cart is empty")]
    EmptyCart,

    /// A required field was left blank. Carries the field's display label.
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Phone(#[from] PhoneError),

    #[error(transparent)]
    Pincode(#[from] PincodeError),

    /// Amounts are pre-formatted with the store's currency symbol.
    #[error("Minimum order amount is {minimum}. Add {shortfall} more to place your order")]
    MinimumOrderNotMet { minimum: String, shortfall: String },

    #[error("Maximum order amount is {maximum}")]
    MaximumOrderExceeded { maximum: String },

    #[error("Cash on Delivery is not available")]
    CodUnavailable,

    #[error("Cash on Delivery is not available for orders above {threshold}")]
    CodAboveThreshold { threshold: String },

    #[error("Online payment is currently unavailable")]
    OnlinePaymentUnavailable,

    /// An earlier attempt already charged the customer online and the order
    /// no longer matches that charge.
    #[error(
        "You already paid {paid} online for this order. Restore your cart to that total to place it"
    )]
    PaymentAlreadyCollected { paid: String },

    #[error(transparent)]
    Coupon(#[from] CouponRejection),
}

/// A transition the checkout state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Please complete the {from} step before continuing to {to}")]
    SkippedStep { from: CheckoutStep, to: CheckoutStep },

    #[error("There is no step after {0}")]
    NoNextStep(CheckoutStep),

    #[error("There is no step before {0}")]
    NoPreviousStep(CheckoutStep),

    /// A slice of the draft was edited while another step was active.
    #[error("{slice} can only be changed on the {expected} step")]
    StepNotActive {
        slice: &'static str,
        expected: CheckoutStep,
    },

    #[error("Orders can only be placed from the {} step", CheckoutStep::Summary)]
    NotAtSummary,

    #[error("Your order is already being placed")]
    SubmissionInFlight,

    #[error("This checkout has ended")]
    SessionClosed,
}

/// Infrastructure trouble outside the customer's control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalFailure {
    #[error("store settings unavailable: {0}")]
    SettingsUnavailable(String),

    #[error("coupon lookup failed: {0}")]
    CouponStore(String),

    #[error("order could not be saved: {0}")]
    OrderStore(String),

    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    #[error("payment cancelled: {0}")]
    PaymentCancelled(String),

    #[error("payment gateway did not respond within {secs}s")]
    GatewayTimeout { secs: u64 },

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("order total cannot be charged: {0}")]
    Amount(#[from] MinorUnitsError),
}

/// Any error a checkout operation can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    External(#[from] ExternalFailure),
}

impl From<CouponRejection> for CheckoutError {
    fn from(rejection: CouponRejection) -> Self {
        Self::Validation(ValidationError::Coupon(rejection))
    }
}

impl CheckoutError {
    /// Text to show the customer.
    ///
    /// Validation and state errors are already specific. External failures
    /// the customer can act on get a retry hint; the rest fall back to
    /// [`GENERIC_FAILURE_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::State(e) => e.to_string(),
            Self::External(e) => match e {
                ExternalFailure::SettingsUnavailable(_) => {
                    "We couldn't load checkout settings. Please try again".to_owned()
                }
                ExternalFailure::CouponStore(_) => {
                    "We couldn't check that coupon right now. Please try again".to_owned()
                }
                ExternalFailure::OrderStore(_) => {
                    "We couldn't save your order. Please try again".to_owned()
                }
                ExternalFailure::PaymentDeclined(reason) => {
                    format!("Payment failed: {reason}. Please try again")
                }
                ExternalFailure::PaymentCancelled(_) => {
                    "Payment was cancelled. You can try again when ready".to_owned()
                }
                ExternalFailure::GatewayTimeout { .. } => {
                    "The payment is taking too long. Please try again".to_owned()
                }
                ExternalFailure::Gateway(_) | ExternalFailure::Amount(_) => {
                    GENERIC_FAILURE_MESSAGE.to_owned()
                }
            },
        }
    }

    /// Whether the customer can simply submit again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::External(_))
    }
}
