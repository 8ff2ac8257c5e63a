//! End-to-end checkout scenarios against in-memory collaborators.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;

use threadline_checkout::{
    CartLine, CheckoutError, CheckoutStep, CouponRejection, DEFAULT_SIZE, DiscountType,
    SessionState, StateError, ValidationError,
};
use threadline_core::{OrderStatus, PaymentMethod, PaymentStatus, ProductId};
use threadline_integration_tests::{
    MemorySettings, ScriptedGateway, address, cart_of, coupon, customer, d, init_tracing,
    memory_checkout, now, store_settings, walk_to_summary,
};

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
async fn test_happy_path_cod_order() {
    init_tracing();
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut cart = cart_of(&[("600", 2)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap();

    let priced = session.priced(&cart, now());
    assert_eq!(priced.subtotal, d("1200"));
    assert_eq!(priced.tax, d("60"));
    assert_eq!(priced.delivery_fee, d("50"));
    assert_eq!(priced.cod_fee, d("20"));
    assert_eq!(priced.total, d("1330"));

    let placed = service
        .place_order(&mut session, &mut cart, now())
        .await
        .unwrap();

    assert_eq!(placed.record.total, d("1330.00"));
    assert_eq!(placed.record.payment_method, PaymentMethod::Cod);
    assert_eq!(placed.record.payment_status, PaymentStatus::Pending);
    assert_eq!(placed.record.order_status, OrderStatus::Pending);
    assert!(placed.record.gateway_payment_id.is_none());
    assert!(placed.order_number().as_str().starts_with("ORD-"));

    assert!(cart.is_empty());
    assert_eq!(session.state(), SessionState::Placed);
    assert_eq!(service.orders().orders().await, vec![placed.record]);
    assert!(service.gateway().requests().await.is_empty());
}

#[tokio::test]
async fn test_coupon_with_free_delivery() {
    let service = memory_checkout(ScriptedGateway::default());
    let mut raw = store_settings();
    raw["tax_rate"] = json!(0);
    let settings = MemorySettings::new(raw);
    service
        .coupons()
        .add(coupon("FLAT300", DiscountType::Fixed, "300"))
        .await;
    let mut cart = cart_of(&[("1000", 2)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    let discount = service
        .apply_coupon_code(&mut session, "flat300", &cart, now())
        .await
        .unwrap();
    assert_eq!(discount, d("300"));

    walk_to_summary(&mut session, &cart, PaymentMethod::Online).unwrap();
    let priced = session.priced(&cart, now());
    assert_eq!(priced.delivery_fee, Decimal::ZERO);
    assert_eq!(priced.total, d("1700"));

    assert_eq!(service.coupons().used_count("FLAT300").await, Some(0));
    let placed = service
        .place_order(&mut session, &mut cart, now())
        .await
        .unwrap();

    assert_eq!(placed.record.discount, d("300.00"));
    assert_eq!(placed.record.total, d("1700.00"));
    assert_eq!(placed.record.coupon_code.as_deref(), Some("FLAT300"));
    assert_eq!(service.coupons().used_count("FLAT300").await, Some(1));
    assert_eq!(service.gateway().requests().await[0].amount, 170_000);
}

// ============================================================================
// Coupons
// ============================================================================

#[tokio::test]
async fn test_percentage_coupon_is_capped() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut half = coupon("HALF", DiscountType::Percentage, "50");
    half.max_discount_amount = Some(d("200"));
    service.coupons().add(half).await;
    let cart = cart_of(&[("1000", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    let discount = service
        .apply_coupon_code(&mut session, "HALF", &cart, now())
        .await
        .unwrap();
    assert_eq!(discount, d("200"));
    assert_eq!(session.priced(&cart, now()).discount, d("200"));
}

#[tokio::test]
async fn test_coupon_minimum_order_not_met() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut big = coupon("BIG", DiscountType::Fixed, "250");
    big.min_order_amount = Some(d("2000"));
    service.coupons().add(big).await;
    let cart = cart_of(&[("1500", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    let err = service
        .apply_coupon_code(&mut session, "BIG", &cart, now())
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Minimum order not met");
    assert!(session.draft().applied_coupon.is_none());
    assert_eq!(session.priced(&cart, now()).discount, Decimal::ZERO);
}

#[tokio::test]
async fn test_unknown_coupon_is_invalid() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let cart = cart_of(&[("1500", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    for code in ["NOSUCH", "   "] {
        let err = service
            .apply_coupon_code(&mut session, code, &cart, now())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Validation(ValidationError::Coupon(CouponRejection::Invalid))
        );
        assert_eq!(err.user_message(), "Invalid coupon");
    }
}

#[tokio::test]
async fn test_removing_coupon_does_not_touch_usage() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    service
        .coupons()
        .add(coupon("WELCOME", DiscountType::Fixed, "100"))
        .await;
    let mut cart = cart_of(&[("1000", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    service
        .apply_coupon_code(&mut session, "WELCOME", &cart, now())
        .await
        .unwrap();
    session.remove_coupon().unwrap();
    assert_eq!(session.priced(&cart, now()).discount, Decimal::ZERO);

    walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap();
    let placed = service
        .place_order(&mut session, &mut cart, now())
        .await
        .unwrap();

    assert!(placed.record.coupon_code.is_none());
    assert_eq!(service.coupons().used_count("WELCOME").await, Some(0));
    assert!(service.coupons().increments().await.is_empty());
}

// ============================================================================
// Step gating
// ============================================================================

#[tokio::test]
async fn test_cannot_skip_from_contact_to_payment() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let cart = cart_of(&[("1000", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    session.set_customer(customer()).unwrap();

    let err = session
        .go_to(CheckoutStep::Payment, &cart, now())
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::State(StateError::SkippedStep { .. })
    ));
    assert_eq!(session.current_step(), CheckoutStep::Contact);
}

#[tokio::test]
async fn test_back_navigation_preserves_address() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let cart = cart_of(&[("1000", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    session.set_customer(customer()).unwrap();
    session.advance(&cart, now()).unwrap();
    session.set_address(address()).unwrap();
    session.advance(&cart, now()).unwrap();
    assert_eq!(session.current_step(), CheckoutStep::Payment);

    session.go_to(CheckoutStep::Contact, &cart, now()).unwrap();
    assert_eq!(session.draft().address, address());

    session.advance(&cart, now()).unwrap();
    session.advance(&cart, now()).unwrap();
    assert_eq!(session.current_step(), CheckoutStep::Payment);
    assert_eq!(session.draft().address, address());
}

#[tokio::test]
async fn test_minimum_order_blocks_every_forward_move() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let cart = cart_of(&[("320", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    session.set_customer(customer()).unwrap();
    let err = session.advance(&cart, now()).unwrap_err();

    assert_eq!(
        err.user_message(),
        "Minimum order amount is ₹500.00. Add ₹180.00 more to place your order"
    );
    assert_eq!(session.current_step(), CheckoutStep::Contact);
}

#[tokio::test]
async fn test_cod_above_threshold_is_refused() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let cart = cart_of(&[("2500", 2)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    let err = walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap_err();

    assert_eq!(
        err.user_message(),
        "Cash on Delivery is not available for orders above ₹5000.00"
    );
    assert_eq!(session.current_step(), CheckoutStep::Payment);

    session.set_payment_method(PaymentMethod::Online).unwrap();
    session.advance(&cart, now()).unwrap();
    assert_eq!(session.current_step(), CheckoutStep::Summary);
}

#[tokio::test]
async fn test_emptied_cart_abandons_checkout() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut cart = cart_of(&[("1000", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap();
    cart.clear();

    let err = service
        .place_order(&mut session, &mut cart, now())
        .await
        .unwrap_err();
    assert_eq!(err, CheckoutError::Validation(ValidationError::EmptyCart));
    assert_eq!(session.state(), SessionState::Abandoned);
    assert_eq!(service.orders().attempts(), 0);
}

#[tokio::test]
async fn test_begin_checkout_with_empty_cart() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let err = service
        .begin_checkout(&settings, &cart_of(&[]))
        .await
        .unwrap_err();
    assert_eq!(err, CheckoutError::Validation(ValidationError::EmptyCart));
}

// ============================================================================
// Placement re-validation
// ============================================================================

#[tokio::test]
async fn test_cart_growing_past_cod_limit_blocks_placement() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut cart = cart_of(&[("2000", 2)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap();
    cart.add(CartLine::new(ProductId::generate(), "Lehenga", d("1000"))).unwrap();

    let err = service
        .place_order(&mut session, &mut cart, now())
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Cash on Delivery is not available for orders above ₹5000.00"
    );
    assert_eq!(service.orders().attempts(), 0);
    assert_eq!(cart.item_count(), 3);
    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.current_step(), CheckoutStep::Summary);
}

#[tokio::test]
async fn test_cart_shrinking_below_minimum_blocks_placement() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut cart = cart_of(&[("300", 2)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap();
    let product_id = cart.lines().first().unwrap().product_id;
    cart.update_quantity(product_id, DEFAULT_SIZE, 1).unwrap();

    let err = service
        .place_order(&mut session, &mut cart, now())
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Minimum order amount is ₹500.00. Add ₹200.00 more to place your order"
    );
    assert_eq!(service.orders().attempts(), 0);
    assert_eq!(cart.item_count(), 1);
    assert_eq!(session.current_step(), CheckoutStep::Summary);
}

#[tokio::test]
async fn test_lapsed_coupon_blocks_placement() {
    let service = memory_checkout(ScriptedGateway::default());
    let settings = MemorySettings::new(store_settings());
    let mut flash = coupon("FLASH", DiscountType::Fixed, "100");
    flash.valid_until = Some(now() + Duration::hours(1));
    service.coupons().add(flash).await;
    let mut cart = cart_of(&[("1000", 1)]);

    let mut session = service.begin_checkout(&settings, &cart).await.unwrap();
    service
        .apply_coupon_code(&mut session, "FLASH", &cart, now())
        .await
        .unwrap();
    walk_to_summary(&mut session, &cart, PaymentMethod::Cod).unwrap();

    let later = now() + Duration::hours(2);
    let err = service
        .place_order(&mut session, &mut cart, later)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CheckoutError::Validation(ValidationError::Coupon(CouponRejection::Expired))
    );
    assert_eq!(err.user_message(), "Coupon has expired");
    assert_eq!(service.orders().attempts(), 0);
    assert_eq!(service.coupons().used_count("FLASH").await, Some(0));
    assert_eq!(cart.item_count(), 1);
    assert!(session.draft().applied_coupon.is_some());
}
