//! Threadline Checkout - pricing, coupons and order assembly.
//!
//! This crate turns a cart, a snapshot of the store's commerce settings, an
//! optional coupon and a payment method into a priced, validated order and
//! drives it through the payment gateway and order store.
//!
//! # Architecture
//!
//! - [`pricing`] and [`coupon`] are pure functions of their inputs. Pricing is
//!   recomputed whenever an input changes and is never stored.
//! - [`checkout`] holds the per-attempt [`CheckoutSession`]: the draft, the
//!   step gates and the submission lock. It is an explicit value owned by the
//!   caller, never ambient state.
//! - [`order`] assembles the immutable [`OrderRecord`] and runs placement
//!   through the external collaborators defined in [`store`] and [`gateway`].
//! - `db` (feature `postgres`) provides `sqlx` implementations of the stores.
//!
//! The crate has no CLI or HTTP surface; the storefront calls it in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupon;
#[cfg(feature = "postgres")]
pub mod db;
pub mod error;
pub mod gateway;
pub mod order;
pub mod pricing;
pub mod settings;
pub mod store;

pub use cart::{Cart, CartError, CartLine, DEFAULT_SIZE};
pub use checkout::{
    AddressDetails, CheckoutDraft, CheckoutPolicy, CheckoutSession, CheckoutStep, CustomerInfo,
    SessionState,
};
pub use config::{CheckoutConfig, ConfigError, GatewayConfig};
pub use coupon::{
    Coupon, CouponRejection, CouponScope, CouponValidation, DiscountType, normalize_code,
};
pub use error::{CheckoutError, ExternalFailure, StateError, ValidationError};
pub use gateway::{
    CollectedPayment, GatewayError, PaymentConfirmation, PaymentCustomer, PaymentGateway,
    PaymentOutcome, PaymentRequest,
};
pub use order::{
    CheckoutService, OrderLine, OrderNumber, OrderRecord, PlacedOrder, ShippingAddress,
};
pub use pricing::{PricedOrder, price};
pub use settings::{
    CommerceSettings, SettingsError, SettingsProvider, SettingsSnapshot, load_settings,
};
pub use store::{CouponStore, OrderStore, StoreError};
