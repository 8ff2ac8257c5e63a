//! The customer's in-progress checkout input.
//!
//! Fields hold raw form input. Nothing here is validated; the step gates
//! parse and check them when the customer moves forward, and the order
//! assembler parses them once more into typed values.

use serde::{Deserialize, Serialize};
use threadline_core::{AddressId, AddressType, PaymentMethod};

use super::CheckoutStep;
use crate::coupon::Coupon;

/// Contact details collected on step 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Delivery address collected on step 2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    pub plot_number: String,
    pub building_name: String,
    pub street: String,
    pub landmark: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub address_type: AddressType,
    /// Label to save the address under, e.g. "Mom's place". Empty to skip.
    pub save_as: String,
    /// Set when the customer picked one of their saved addresses.
    pub use_saved_address: Option<AddressId>,
}

impl AddressDetails {
    /// Whether the address came from the customer's address book.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        self.use_saved_address.is_some()
    }
}

/// Everything the customer has entered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub customer: CustomerInfo,
    pub address: AddressDetails,
    pub payment_method: PaymentMethod,
    pub applied_coupon: Option<Coupon>,
    pub current_step: CheckoutStep,
}

impl Default for CheckoutDraft {
    fn default() -> Self {
        Self {
            customer: CustomerInfo::default(),
            address: AddressDetails::default(),
            payment_method: PaymentMethod::default(),
            applied_coupon: None,
            current_step: CheckoutStep::FIRST,
        }
    }
}
