//! Integration tests for Threadline checkout.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p threadline-integration-tests
//!
//! # Including the PostgreSQL adapter tests
//! DATABASE_URL=postgres://localhost/threadline_test \
//!     cargo test -p threadline-integration-tests -- --include-ignored
//! ```
//!
//! This crate provides in-memory stand-ins for the checkout's external
//! collaborators (settings source, coupon store, order store and payment
//! gateway) plus fixtures shared by the scenario tests in `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use threadline_checkout::{
    AddressDetails, Cart, CartLine, CheckoutConfig, CheckoutError, CheckoutService,
    CheckoutSession, Coupon, CouponScope, CouponStore, CustomerInfo, DiscountType, GatewayConfig,
    GatewayError, OrderRecord, OrderStore, PaymentConfirmation, PaymentGateway, PaymentOutcome,
    PaymentRequest, SettingsProvider, SettingsSnapshot, StoreError, normalize_code,
};
use threadline_core::{CouponId, OrderId, PaymentMethod, ProductId};

/// Service wired to the in-memory collaborators.
pub type MemoryCheckout = CheckoutService<MemoryOrderStore, MemoryCouponStore, ScriptedGateway>;

// =============================================================================
// Fixtures
// =============================================================================

/// Install a test-friendly tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threadline_checkout=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Fixed clock for reproducible order numbers and coupon windows.
///
/// # Panics
///
/// Never; the literal is a valid RFC 3339 timestamp.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn now() -> DateTime<Utc> {
    "2026-10-16T10:00:00Z".parse().unwrap()
}

/// Parse a decimal literal.
///
/// # Panics
///
/// Panics if `s` is not a decimal literal.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// The store settings used across scenarios: 5% tax, ₹50 delivery (free from
/// ₹1500), COD for ₹20 up to ₹5000, ₹500 minimum order.
#[must_use]
pub fn store_settings() -> Value {
    json!({
        "tax_rate": "5",
        "delivery_charge": 50,
        "free_delivery_threshold": "1500",
        "cod_enabled": "true",
        "cod_charge": 20,
        "cod_threshold": "5000",
        "min_order_amount": 500,
        "currency_symbol": "₹",
    })
}

#[must_use]
pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Priya Sharma".to_owned(),
        email: "priya.sharma@example.in".to_owned(),
        phone: "98200 12345".to_owned(),
    }
}

#[must_use]
pub fn address() -> AddressDetails {
    AddressDetails {
        plot_number: "B-402".to_owned(),
        building_name: "Sai Residency".to_owned(),
        street: "Linking Road".to_owned(),
        landmark: "Near Bandra Station".to_owned(),
        city: "Mumbai".to_owned(),
        state: "Maharashtra".to_owned(),
        pincode: "400050".to_owned(),
        ..AddressDetails::default()
    }
}

/// Build a cart from `(unit_price, quantity)` pairs.
///
/// # Panics
///
/// Panics if a price is not positive or a quantity is zero.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn cart_of(items: &[(&str, u32)]) -> Cart {
    let mut cart = Cart::new();
    for (i, (price, quantity)) in items.iter().enumerate() {
        cart.add(
            CartLine::new(ProductId::generate(), format!("Item {}", i + 1), d(price))
                .with_quantity(*quantity),
        )
        .unwrap();
    }
    cart
}

/// An active, unlimited coupon with no validity window.
#[must_use]
pub fn coupon(code: &str, discount_type: DiscountType, value: &str) -> Coupon {
    Coupon {
        id: CouponId::generate(),
        code: normalize_code(code),
        discount_type,
        discount_value: d(value),
        min_order_amount: None,
        max_discount_amount: None,
        usage_limit: None,
        used_count: 0,
        is_active: true,
        valid_from: None,
        valid_until: None,
        scope: CouponScope::AllProducts,
    }
}

/// Default configuration plus sandbox gateway credentials.
#[must_use]
pub fn checkout_config() -> CheckoutConfig {
    CheckoutConfig {
        gateway: Some(GatewayConfig {
            key_id: "rzp_test_threadline".to_owned(),
            key_secret: SecretString::from("test_secret"),
        }),
        ..CheckoutConfig::default()
    }
}

/// Service with [`checkout_config`] over fresh in-memory collaborators.
#[must_use]
pub fn memory_checkout(gateway: ScriptedGateway) -> MemoryCheckout {
    CheckoutService::new(
        MemoryOrderStore::default(),
        MemoryCouponStore::default(),
        gateway,
        checkout_config(),
    )
}

/// Fill in every step with the fixture customer and address and move the
/// session to the summary step.
///
/// # Errors
///
/// Returns the first gate that fails.
pub fn walk_to_summary(
    session: &mut CheckoutSession,
    cart: &Cart,
    method: PaymentMethod,
) -> Result<(), CheckoutError> {
    session.set_customer(customer())?;
    session.advance(cart, now())?;
    session.set_address(address())?;
    session.advance(cart, now())?;
    session.set_payment_method(method)?;
    session.advance(cart, now())?;
    Ok(())
}

// =============================================================================
// Settings
// =============================================================================

/// Settings source backed by a JSON object.
#[derive(Debug, Default)]
pub struct MemorySettings {
    snapshot: SettingsSnapshot,
    offline: AtomicBool,
}

impl MemorySettings {
    /// # Panics
    ///
    /// Panics if `value` is not a JSON object.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new(value: Value) -> Self {
        Self {
            snapshot: serde_json::from_value(value).unwrap(),
            offline: AtomicBool::new(false),
        }
    }

    /// A settings source that always fails.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            snapshot: SettingsSnapshot::new(),
            offline: AtomicBool::new(true),
        }
    }
}

impl SettingsProvider for MemorySettings {
    async fn fetch(&self) -> Result<SettingsSnapshot, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("settings service offline".to_owned()));
        }
        Ok(self.snapshot.clone())
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// Coupon store keyed by normalized code.
#[derive(Debug, Default)]
pub struct MemoryCouponStore {
    coupons: Mutex<HashMap<String, Coupon>>,
    increments: Mutex<Vec<CouponId>>,
    offline: AtomicBool,
}

impl MemoryCouponStore {
    pub async fn add(&self, coupon: Coupon) {
        self.coupons
            .lock()
            .await
            .insert(normalize_code(&coupon.code), coupon);
    }

    pub async fn used_count(&self, code: &str) -> Option<u32> {
        self.coupons
            .lock()
            .await
            .get(&normalize_code(code))
            .map(|c| c.used_count)
    }

    /// Coupon ids whose usage was incremented, in call order.
    pub async fn increments(&self) -> Vec<CouponId> {
        self.increments.lock().await.clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl CouponStore for MemoryCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("coupon table offline".to_owned()));
        }
        Ok(self.coupons.lock().await.get(&normalize_code(code)).cloned())
    }

    async fn increment_usage(&self, id: CouponId) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("coupon table offline".to_owned()));
        }
        let mut coupons = self.coupons.lock().await;
        let coupon = coupons
            .values_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("coupon {id} not found")))?;
        coupon.used_count += 1;
        self.increments.lock().await.push(id);
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order store that can be told to fail its next inserts.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<(OrderId, OrderRecord)>>,
    failures_remaining: AtomicUsize,
    conflicts_remaining: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemoryOrderStore {
    /// Make the next `count` inserts fail as if the store were unreachable.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` inserts report a duplicate order number.
    pub fn conflict_next(&self, count: usize) {
        self.conflicts_remaining.store(count, Ordering::SeqCst);
    }

    pub async fn orders(&self) -> Vec<OrderRecord> {
        self.orders
            .lock()
            .await
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Inserts attempted, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &OrderRecord) -> Result<OrderId, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Unavailable("connection reset by peer".to_owned()));
        }
        if self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }

        let mut orders = self.orders.lock().await;
        if orders
            .iter()
            .any(|(_, existing)| existing.order_number == order.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        let id = OrderId::generate();
        orders.push((id, order.clone()));
        Ok(id)
    }
}

// =============================================================================
// Payment gateway
// =============================================================================

/// Gateway that replays queued outcomes, succeeding once the queue is empty.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<PaymentOutcome, GatewayError>>>,
    requests: Mutex<Vec<PaymentRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    /// A gateway that takes `delay` to answer every request.
    #[must_use]
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn push(&self, outcome: Result<PaymentOutcome, GatewayError>) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().await.clone()
    }
}

impl PaymentGateway for ScriptedGateway {
    async fn collect(&self, request: &PaymentRequest) -> Result<PaymentOutcome, GatewayError> {
        let attempt = {
            let mut requests = self.requests.lock().await;
            requests.push(request.clone());
            requests.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcomes.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(PaymentOutcome::Succeeded(PaymentConfirmation {
                gateway_order_id: format!("order_{}", request.order_number),
                gateway_payment_id: format!("pay_{attempt:04}"),
            })),
        }
    }
}
