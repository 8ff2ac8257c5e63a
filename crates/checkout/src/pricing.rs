//! Checkout pricing.
//!
//! [`price`] is a pure function of the cart lines, settings, payment method
//! and discount. Call it again whenever any of those change; the result is
//! never stored, so it can't drift from its inputs.
//!
//! All arithmetic is exact [`Decimal`] at full precision. Rounding to the
//! currency's two places happens only in [`PricedOrder::rounded`], at the
//! display/persist boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use threadline_core::{PaymentMethod, round_currency};

use crate::cart::CartLine;
use crate::settings::CommerceSettings;

/// Itemized totals and order-readiness flags for a cart.
///
/// `total == subtotal + tax + delivery_fee + cod_fee - discount` and
/// `total >= 0` always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOrder {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub cod_fee: Decimal,
    /// Discount actually applied, after clamping to the gross amount.
    pub discount: Decimal,
    pub total: Decimal,
    pub is_min_order_met: bool,
    pub min_order_shortfall: Decimal,
    pub is_cod_eligible: bool,
}

/// Price a cart.
///
/// `discount` is the coupon discount already computed by the coupon
/// validator. It is clamped to `[0, subtotal + tax + fees]` so the total can
/// never go negative.
#[must_use]
pub fn price(
    lines: &[CartLine],
    settings: &CommerceSettings,
    payment_method: PaymentMethod,
    discount: Decimal,
) -> PricedOrder {
    let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
    let tax = subtotal * settings.tax_rate / Decimal::ONE_HUNDRED;

    let free_delivery = settings.free_delivery_threshold > Decimal::ZERO
        && subtotal >= settings.free_delivery_threshold;
    let delivery_fee = if free_delivery {
        Decimal::ZERO
    } else {
        settings.delivery_charge
    };

    let cod_fee = match payment_method {
        PaymentMethod::Cod => settings.cod_charge,
        PaymentMethod::Online => Decimal::ZERO,
    };

    let gross = subtotal + tax + delivery_fee + cod_fee;
    let discount = discount.min(gross).max(Decimal::ZERO);
    let total = gross - discount;

    let min_order_shortfall = (settings.min_order_amount - subtotal).max(Decimal::ZERO);

    let mut priced = PricedOrder {
        subtotal,
        tax,
        delivery_fee,
        cod_fee,
        discount,
        total,
        is_min_order_met: subtotal >= settings.min_order_amount,
        min_order_shortfall,
        is_cod_eligible: false,
    };
    priced.is_cod_eligible = settings.cod_enabled && priced.within_cod_threshold(settings);
    priced
}

impl PricedOrder {
    /// The breakdown rounded half-up to two places for display or storage.
    ///
    /// Components are rounded individually and the total is re-derived from
    /// them, so the rounded view still satisfies the total identity. The
    /// readiness flags are carried over from the full-precision computation.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let subtotal = round_currency(self.subtotal);
        let tax = round_currency(self.tax);
        let delivery_fee = round_currency(self.delivery_fee);
        let cod_fee = round_currency(self.cod_fee);
        let gross = subtotal + tax + delivery_fee + cod_fee;
        let discount = round_currency(self.discount).min(gross);

        Self {
            subtotal,
            tax,
            delivery_fee,
            cod_fee,
            discount,
            total: gross - discount,
            is_min_order_met: self.is_min_order_met,
            min_order_shortfall: round_currency(self.min_order_shortfall),
            is_cod_eligible: self.is_cod_eligible,
        }
    }

    /// Whether the total the customer would be charged fits under the COD
    /// ceiling. Compared on the rounded total, the same amount the order
    /// record stores.
    #[must_use]
    pub fn within_cod_threshold(&self, settings: &CommerceSettings) -> bool {
        !settings.has_cod_threshold() || self.rounded().total <= settings.cod_threshold
    }

    /// Whether the total is above the store's maximum order amount.
    #[must_use]
    pub fn exceeds_max_order(&self, settings: &CommerceSettings) -> bool {
        settings.has_max_order_amount() && self.total > settings.max_order_amount
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use threadline_core::ProductId;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(price: &str, quantity: u32) -> CartLine {
        CartLine::new(ProductId::generate(), "Kurta", d(price)).with_quantity(quantity)
    }

    fn settings() -> CommerceSettings {
        CommerceSettings {
            tax_rate: d("5"),
            delivery_charge: d("50"),
            free_delivery_threshold: d("1500"),
            cod_enabled: true,
            cod_charge: d("20"),
            cod_threshold: d("5000"),
            min_order_amount: d("500"),
            ..CommerceSettings::default()
        }
    }

    fn assert_identity(p: &PricedOrder) {
        assert_eq!(
            p.total,
            p.subtotal + p.tax + p.delivery_fee + p.cod_fee - p.discount
        );
        assert!(p.total >= Decimal::ZERO);
    }

    #[test]
    fn test_happy_path_cod_breakdown() {
        let p = price(&[line("600", 2)], &settings(), PaymentMethod::Cod, Decimal::ZERO);

        assert_eq!(p.subtotal, d("1200"));
        assert_eq!(p.tax, d("60"));
        assert_eq!(p.delivery_fee, d("50"));
        assert_eq!(p.cod_fee, d("20"));
        assert_eq!(p.total, d("1330"));
        assert!(p.is_min_order_met);
        assert!(p.is_cod_eligible);
        assert_identity(&p);
    }

    #[test]
    fn test_online_has_no_cod_fee() {
        let p = price(&[line("600", 2)], &settings(), PaymentMethod::Online, Decimal::ZERO);
        assert_eq!(p.cod_fee, Decimal::ZERO);
        assert_eq!(p.total, d("1310"));
    }

    #[test]
    fn test_free_delivery_boundary() {
        let s = CommerceSettings {
            free_delivery_threshold: d("1000"),
            ..settings()
        };

        let below = price(&[line("999.99", 1)], &s, PaymentMethod::Online, Decimal::ZERO);
        assert_eq!(below.delivery_fee, d("50"));

        let at = price(&[line("1000.00", 1)], &s, PaymentMethod::Online, Decimal::ZERO);
        assert_eq!(at.delivery_fee, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_threshold_disables_free_delivery() {
        for threshold in ["0", "-1"] {
            let s = CommerceSettings {
                free_delivery_threshold: d(threshold),
                ..settings()
            };
            let p = price(&[line("100000", 1)], &s, PaymentMethod::Online, Decimal::ZERO);
            assert_eq!(p.delivery_fee, d("50"), "threshold {threshold}");
        }
    }

    #[test]
    fn test_cod_eligibility_boundary() {
        let s = CommerceSettings {
            tax_rate: Decimal::ZERO,
            delivery_charge: Decimal::ZERO,
            cod_charge: Decimal::ZERO,
            ..settings()
        };

        let at = price(&[line("5000", 1)], &s, PaymentMethod::Cod, Decimal::ZERO);
        assert_eq!(at.total, d("5000"));
        assert!(at.is_cod_eligible);

        let above = price(&[line("5000.01", 1)], &s, PaymentMethod::Cod, Decimal::ZERO);
        assert!(!above.is_cod_eligible);
    }

    #[test]
    fn test_cod_eligibility_uses_charged_total() {
        let s = CommerceSettings {
            tax_rate: d("0.00008"),
            delivery_charge: Decimal::ZERO,
            cod_charge: Decimal::ZERO,
            ..settings()
        };

        // 0.004 of tax rounds away, so the charged total is 5000.00
        let p = price(&[line("5000", 1)], &s, PaymentMethod::Cod, Decimal::ZERO);
        assert!(p.total > d("5000"));
        assert_eq!(p.rounded().total, d("5000.00"));
        assert!(p.is_cod_eligible);
        assert!(p.within_cod_threshold(&s));
    }

    #[test]
    fn test_cod_disabled_is_never_eligible() {
        let s = CommerceSettings {
            cod_enabled: false,
            ..settings()
        };
        let p = price(&[line("100", 1)], &s, PaymentMethod::Cod, Decimal::ZERO);
        assert!(!p.is_cod_eligible);
    }

    #[test]
    fn test_min_order_shortfall() {
        let p = price(&[line("320", 1)], &settings(), PaymentMethod::Online, Decimal::ZERO);
        assert!(!p.is_min_order_met);
        assert_eq!(p.min_order_shortfall, d("180"));

        let p = price(&[line("500", 1)], &settings(), PaymentMethod::Online, Decimal::ZERO);
        assert!(p.is_min_order_met);
        assert_eq!(p.min_order_shortfall, Decimal::ZERO);
    }

    #[test]
    fn test_coupon_with_free_delivery() {
        let s = CommerceSettings {
            tax_rate: Decimal::ZERO,
            ..settings()
        };
        let p = price(&[line("1000", 2)], &s, PaymentMethod::Online, d("300"));
        assert_eq!(p.delivery_fee, Decimal::ZERO);
        assert_eq!(p.total, d("1700"));
        assert_identity(&p);
    }

    #[test]
    fn test_oversized_discount_is_clamped() {
        let p = price(&[line("100", 1)], &settings(), PaymentMethod::Cod, d("10000"));
        assert_eq!(p.total, Decimal::ZERO);
        assert_eq!(p.discount, d("175"));
        assert_identity(&p);
    }

    #[test]
    fn test_negative_discount_is_ignored() {
        let p = price(&[line("100", 1)], &settings(), PaymentMethod::Online, d("-50"));
        assert_eq!(p.discount, Decimal::ZERO);
        assert_identity(&p);
    }

    #[test]
    fn test_identity_across_combinations() {
        let carts = [
            vec![],
            vec![line("0.01", 1)],
            vec![line("333.33", 3), line("19.99", 7)],
            vec![line("4999.99", 1)],
        ];
        let discounts = ["0", "0.005", "150", "99999"];
        for lines in &carts {
            for method in [PaymentMethod::Online, PaymentMethod::Cod] {
                for discount in discounts {
                    let p = price(lines, &settings(), method, d(discount));
                    assert_identity(&p);
                    assert_identity(&p.rounded());
                }
            }
        }
    }

    #[test]
    fn test_repricing_is_idempotent() {
        let lines = [line("333.33", 3), line("19.99", 7)];
        let first = price(&lines, &settings(), PaymentMethod::Cod, d("12.5"));
        let second = price(&lines, &settings(), PaymentMethod::Cod, d("12.5"));
        assert_eq!(first, second);
        assert_eq!(first.total.scale(), second.total.scale());
    }

    #[test]
    fn test_tax_keeps_full_precision_until_rounded() {
        let s = CommerceSettings {
            tax_rate: d("18"),
            ..settings()
        };
        let p = price(&[line("0.05", 1)], &s, PaymentMethod::Online, Decimal::ZERO);
        assert_eq!(p.tax, d("0.009"));
        assert_eq!(p.rounded().tax, d("0.01"));
    }

    #[test]
    fn test_exceeds_max_order() {
        let s = CommerceSettings {
            max_order_amount: d("1000"),
            ..settings()
        };
        let p = price(&[line("2000", 1)], &s, PaymentMethod::Online, Decimal::ZERO);
        assert!(p.exceeds_max_order(&s));
        assert!(!p.exceeds_max_order(&settings()));
    }
}
