//! The four-step checkout state machine.
//!
//! Contact → Address → Payment → Summary. Forward moves go one step at a
//! time through that step's gate plus the order-amount guard; backward moves
//! may jump to any earlier step and never discard data.

mod draft;
mod gates;
mod session;
mod step;

pub use draft::{AddressDetails, CheckoutDraft, CustomerInfo};
pub use gates::{
    CheckoutPolicy, ValidContact, validate_address, validate_contact, validate_order_amount,
    validate_payment_method,
};
pub use session::{CheckoutSession, SessionState, Submission};
pub use step::CheckoutStep;
