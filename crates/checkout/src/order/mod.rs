//! Order assembly and placement.

mod number;
mod record;
mod service;

pub use number::OrderNumber;
pub use record::{OrderLine, OrderRecord, ShippingAddress};
pub use service::{CheckoutService, PlacedOrder};
