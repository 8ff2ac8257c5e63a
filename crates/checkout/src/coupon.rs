//! Coupon validation and discount computation.
//!
//! Coupons are fetched read-only from the store. Validation is a pure
//! function of the coupon, the cart and the current time; the store's
//! `used_count` is only ever bumped after an order is placed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use threadline_core::{CouponId, ProductId};

use crate::cart::CartLine;

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` percent of the subtotal.
    Percentage,
    /// `discount_value` off, in currency units.
    Fixed,
}

/// Products a coupon may be used against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "product_ids")]
pub enum CouponScope {
    #[default]
    AllProducts,
    /// Usable only when at least one of these products is in the cart.
    Products(Vec<ProductId>),
}

/// A discount coupon as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Uppercase code.
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    /// Cap on percentage discounts.
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scope: CouponScope,
}

/// Why a coupon was turned down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Invalid coupon")]
    Invalid,
    #[error("Coupon does not apply to the items in your cart")]
    NotApplicable,
    #[error("Coupon has expired")]
    Expired,
    #[error("Minimum order not met")]
    MinimumOrderNotMet { minimum: Decimal },
    #[error("Coupon expired/exhausted")]
    Exhausted,
}

/// Outcome of validating a coupon against a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponValidation {
    pub valid: bool,
    /// Zero whenever `valid` is false.
    pub discount_amount: Decimal,
    pub reason: Option<CouponRejection>,
}

impl CouponValidation {
    fn accepted(discount_amount: Decimal) -> Self {
        Self {
            valid: true,
            discount_amount,
            reason: None,
        }
    }

    fn rejected(reason: CouponRejection) -> Self {
        Self {
            valid: false,
            discount_amount: Decimal::ZERO,
            reason: Some(reason),
        }
    }

    /// Convert into a `Result`, yielding the discount on success.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason if the coupon was not valid.
    pub fn into_result(self) -> Result<Decimal, CouponRejection> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(self.discount_amount),
        }
    }
}

/// Normalize customer input for lookup: trimmed and uppercase.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Discount this coupon grants on `subtotal`, ignoring validity.
    ///
    /// Percentage discounts are capped at `max_discount_amount`. Fixed
    /// discounts are not capped here; pricing clamps the final total.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => {
                let raw = subtotal * self.discount_value / Decimal::ONE_HUNDRED;
                self.max_discount_amount.map_or(raw, |cap| raw.min(cap))
            }
            DiscountType::Fixed => self.discount_value,
        }
    }

    /// Whether the coupon's product scope matches anything in the cart.
    #[must_use]
    pub fn applies_to(&self, lines: &[CartLine]) -> bool {
        match &self.scope {
            CouponScope::AllProducts => true,
            CouponScope::Products(ids) => lines.iter().any(|l| ids.contains(&l.product_id)),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.used_count >= limit)
    }
}

/// Validate `code` against the coupon the store returned for it.
///
/// Checks run in this order, and the first failure wins:
/// 1. the coupon exists and its code matches (case-insensitive)
/// 2. its product scope matches at least one cart line
/// 3. it is active and its validity window has started
/// 4. it has not expired
/// 5. its minimum order amount is met by `subtotal`
/// 6. its usage limit is not exhausted
#[must_use]
pub fn validate(
    code: &str,
    subtotal: Decimal,
    coupon: Option<&Coupon>,
    lines: &[CartLine],
    now: DateTime<Utc>,
) -> CouponValidation {
    let Some(coupon) = coupon.filter(|c| normalize_code(&c.code) == normalize_code(code)) else {
        return CouponValidation::rejected(CouponRejection::Invalid);
    };

    if !coupon.applies_to(lines) {
        return CouponValidation::rejected(CouponRejection::NotApplicable);
    }

    if !coupon.is_active || coupon.valid_from.is_some_and(|from| now < from) {
        return CouponValidation::rejected(CouponRejection::Invalid);
    }

    if coupon.valid_until.is_some_and(|until| now > until) {
        return CouponValidation::rejected(CouponRejection::Expired);
    }

    if let Some(minimum) = coupon.min_order_amount
        && subtotal < minimum
    {
        return CouponValidation::rejected(CouponRejection::MinimumOrderNotMet { minimum });
    }

    if coupon.is_exhausted() {
        return CouponValidation::rejected(CouponRejection::Exhausted);
    }

    CouponValidation::accepted(coupon.discount_for(subtotal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-10-16T10:00:00Z".parse().unwrap()
    }

    fn coupon(discount_type: DiscountType, value: &str) -> Coupon {
        Coupon {
            id: CouponId::generate(),
            code: "FESTIVE50".to_owned(),
            discount_type,
            discount_value: d(value),
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            used_count: 0,
            is_active: true,
            valid_from: Some(now() - Duration::days(7)),
            valid_until: Some(now() + Duration::days(7)),
            scope: CouponScope::AllProducts,
        }
    }

    fn cart() -> Vec<CartLine> {
        vec![CartLine::new(ProductId::generate(), "Denim Jacket", d("1000"))]
    }

    #[test]
    fn test_percentage_is_capped() {
        let mut c = coupon(DiscountType::Percentage, "50");
        c.max_discount_amount = Some(d("200"));

        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert!(v.valid);
        assert_eq!(v.discount_amount, d("200"));
    }

    #[test]
    fn test_percentage_without_cap() {
        let c = coupon(DiscountType::Percentage, "50");
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.discount_amount, d("500"));
    }

    #[test]
    fn test_fixed_is_not_capped_to_subtotal() {
        let c = coupon(DiscountType::Fixed, "300");
        let v = validate("FESTIVE50", d("100"), Some(&c), &cart(), now());
        assert!(v.valid);
        assert_eq!(v.discount_amount, d("300"));
    }

    #[test]
    fn test_code_is_case_insensitive() {
        let c = coupon(DiscountType::Fixed, "300");
        let v = validate("  festive50 ", d("1000"), Some(&c), &cart(), now());
        assert!(v.valid);
    }

    #[test]
    fn test_missing_or_mismatched_coupon_is_invalid() {
        let v = validate("NOPE", d("1000"), None, &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Invalid));

        let c = coupon(DiscountType::Fixed, "300");
        let v = validate("OTHER", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Invalid));
        assert_eq!(v.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn test_inactive_and_not_yet_started_are_invalid() {
        let mut c = coupon(DiscountType::Fixed, "300");
        c.is_active = false;
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Invalid));

        let mut c = coupon(DiscountType::Fixed, "300");
        c.valid_from = Some(now() + Duration::hours(1));
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Invalid));
    }

    #[test]
    fn test_expired() {
        let mut c = coupon(DiscountType::Fixed, "300");
        c.valid_until = Some(now() - Duration::seconds(1));
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Expired));
    }

    #[test]
    fn test_minimum_order_not_met() {
        let mut c = coupon(DiscountType::Fixed, "300");
        c.min_order_amount = Some(d("2000"));
        let v = validate("FESTIVE50", d("1500"), Some(&c), &cart(), now());
        assert!(!v.valid);
        assert_eq!(v.discount_amount, Decimal::ZERO);
        assert_eq!(
            v.reason,
            Some(CouponRejection::MinimumOrderNotMet { minimum: d("2000") })
        );
        assert_eq!(v.reason.unwrap().to_string(), "Minimum order not met");
    }

    #[test]
    fn test_exhausted() {
        let mut c = coupon(DiscountType::Fixed, "300");
        c.usage_limit = Some(10);
        c.used_count = 10;
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Exhausted));

        c.used_count = 9;
        assert!(validate("FESTIVE50", d("1000"), Some(&c), &cart(), now()).valid);
    }

    #[test]
    fn test_priority_expired_before_minimum_and_exhausted() {
        let mut c = coupon(DiscountType::Fixed, "300");
        c.valid_until = Some(now() - Duration::days(1));
        c.min_order_amount = Some(d("5000"));
        c.usage_limit = Some(1);
        c.used_count = 1;
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert_eq!(v.reason, Some(CouponRejection::Expired));
    }

    #[test]
    fn test_priority_minimum_before_exhausted() {
        let mut c = coupon(DiscountType::Fixed, "300");
        c.min_order_amount = Some(d("5000"));
        c.usage_limit = Some(1);
        c.used_count = 1;
        let v = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now());
        assert!(matches!(
            v.reason,
            Some(CouponRejection::MinimumOrderNotMet { .. })
        ));
    }

    #[test]
    fn test_product_scope_runs_first() {
        let lines = cart();
        let mut c = coupon(DiscountType::Fixed, "300");
        c.is_active = false;
        c.scope = CouponScope::Products(vec![ProductId::generate()]);
        let v = validate("FESTIVE50", d("1000"), Some(&c), &lines, now());
        assert_eq!(v.reason, Some(CouponRejection::NotApplicable));

        c.is_active = true;
        c.scope = CouponScope::Products(vec![lines[0].product_id]);
        assert!(validate("FESTIVE50", d("1000"), Some(&c), &lines, now()).valid);
    }

    #[test]
    fn test_into_result() {
        let c = coupon(DiscountType::Fixed, "300");
        let ok = validate("FESTIVE50", d("1000"), Some(&c), &cart(), now()).into_result();
        assert_eq!(ok, Ok(d("300")));

        let err = validate("X", d("1000"), None, &cart(), now()).into_result();
        assert_eq!(err, Err(CouponRejection::Invalid));
    }
}
