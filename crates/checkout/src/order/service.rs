//! Order placement.
//!
//! [`CheckoutService`] drives a session's submission through the payment
//! gateway and the order store. Side effects happen in a fixed order:
//!
//! 1. payment (online only), finalized into the record on success
//! 2. order insert
//! 3. coupon usage increment and cart clear, only after the insert succeeded
//!
//! A failure at step 1 or 2 leaves the cart, the coupon and the session at the
//! summary step exactly as they were, so the customer can resubmit.
//!
//! A payment collected by an attempt whose insert failed stays on the session
//! under its order number. The next submission reuses it instead of charging
//! again, and is refused if the order no longer adds up to that charge.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use threadline_core::{OrderId, PaymentMethod, to_minor_units};
use tracing::{Span, debug, field, info, instrument, warn};

use super::{OrderNumber, OrderRecord};
use crate::cart::Cart;
use crate::checkout::{CheckoutSession, ValidContact};
use crate::config::CheckoutConfig;
use crate::coupon::{CouponRejection, normalize_code};
use crate::error::{CheckoutError, ExternalFailure};
use crate::gateway::{
    CollectedPayment, PaymentCustomer, PaymentGateway, PaymentOutcome, PaymentRequest,
};
use crate::settings::{SettingsProvider, load_settings};
use crate::store::{CouponStore, OrderStore, StoreError};

/// A successfully stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub record: OrderRecord,
}

/// Checkout operations that talk to external collaborators.
#[derive(Debug, Clone)]
pub struct CheckoutService<O, C, G> {
    orders: O,
    coupons: C,
    gateway: G,
    config: CheckoutConfig,
}

impl<O, C, G> CheckoutService<O, C, G>
where
    O: OrderStore + Sync,
    C: CouponStore + Sync,
    G: PaymentGateway + Sync,
{
    pub const fn new(orders: O, coupons: C, gateway: G, config: CheckoutConfig) -> Self {
        Self {
            orders,
            coupons,
            gateway,
            config,
        }
    }

    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub const fn orders(&self) -> &O {
        &self.orders
    }

    pub const fn coupons(&self) -> &C {
        &self.coupons
    }

    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Load the store settings and start a checkout for `cart`.
    ///
    /// Online payment is offered only when the store enables it and gateway
    /// credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalFailure::SettingsUnavailable`] if the settings can't
    /// be loaded, or [`ValidationError::EmptyCart`](crate::ValidationError::EmptyCart).
    #[instrument(skip_all, fields(items = cart.item_count()))]
    pub async fn begin_checkout<P>(
        &self,
        provider: &P,
        cart: &Cart,
    ) -> Result<CheckoutSession, CheckoutError>
    where
        P: SettingsProvider + Sync,
    {
        let mut settings = load_settings(provider).await.map_err(|e| {
            warn!(error = %e, "failed to load commerce settings");
            ExternalFailure::SettingsUnavailable(e.to_string())
        })?;
        if settings.online_payment_enabled && !self.config.online_payments_configured() {
            debug!("no payment gateway credentials, online payment unavailable");
            settings.online_payment_enabled = false;
        }
        Ok(CheckoutSession::start(
            settings,
            self.config.policy.clone(),
            cart,
        )?)
    }

    /// Look up `code` in the coupon store and apply it to the session.
    ///
    /// # Errors
    ///
    /// Returns the coupon rejection, or [`ExternalFailure::CouponStore`] if the
    /// lookup fails.
    #[instrument(skip(self, session, cart, now), fields(code = %normalize_code(code)))]
    pub async fn apply_coupon_code(
        &self,
        session: &mut CheckoutSession,
        code: &str,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CheckoutError> {
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            return Err(CouponRejection::Invalid.into());
        }
        let coupon = self.coupons.find_by_code(&normalized).await.map_err(|e| {
            warn!(error = %e, "coupon lookup failed");
            ExternalFailure::CouponStore(e.to_string())
        })?;
        session.apply_coupon(&normalized, coupon, cart, now)
    }

    /// Place the order for a session at the summary step.
    ///
    /// On success the session is closed and `cart` is cleared. On failure
    /// both are untouched and the same order number is reused next time.
    ///
    /// # Errors
    ///
    /// Returns a validation or state error if the draft can't be placed, or
    /// an [`ExternalFailure`] from the gateway or order store.
    #[instrument(
        skip_all,
        fields(
            order_number = field::Empty,
            payment_method = %session.draft().payment_method,
        )
    )]
    pub async fn place_order(
        &self,
        session: &mut CheckoutSession,
        cart: &mut Cart,
        now: DateTime<Utc>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let mut submission = session.begin_submission(cart, &self.config.order_prefix, now)?;
        Span::current().record("order_number", submission.order_number().as_str());

        let mut record = OrderRecord::assemble(
            submission.order_number().clone(),
            submission.draft(),
            submission.priced(),
            cart.lines(),
            &self.config.policy,
            now,
        )?;

        if record.payment_method == PaymentMethod::Online {
            let confirmation = if let Some(paid) = submission.pending_payment() {
                info!("reusing payment collected by an earlier attempt");
                paid.confirmation.clone()
            } else {
                let paid = self.collect_payment(submission.contact(), &record).await?;
                let confirmation = paid.confirmation.clone();
                submission.record_payment(paid);
                confirmation
            };
            record.finalize_payment(&confirmation);
        }

        let order_id = match self.orders.insert(&record).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "order insert failed");
                if matches!(e, StoreError::Conflict(_)) && !submission.release_order_number() {
                    warn!("order number kept, a payment was already collected under it");
                }
                return Err(ExternalFailure::OrderStore(e.to_string()).into());
            }
        };
        submission.complete();

        if let Some(coupon_id) = record.coupon_id
            && let Err(e) = self.coupons.increment_usage(coupon_id).await
        {
            warn!(error = %e, %coupon_id, "failed to record coupon usage");
        }
        cart.clear();

        info!(%order_id, total = %record.total, "order placed");
        Ok(PlacedOrder { order_id, record })
    }

    #[instrument(skip_all, fields(amount = field::Empty))]
    async fn collect_payment(
        &self,
        contact: &ValidContact,
        record: &OrderRecord,
    ) -> Result<CollectedPayment, CheckoutError> {
        let amount = to_minor_units(record.total).map_err(ExternalFailure::from)?;
        Span::current().record("amount", amount);

        let request = PaymentRequest {
            amount,
            currency: self.config.currency,
            order_number: record.order_number.clone(),
            customer: PaymentCustomer {
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
            },
        };

        let limit = self.config.gateway_timeout;
        let outcome = tokio::time::timeout(limit, self.gateway.collect(&request))
            .await
            .map_err(|_| {
                warn!(timeout_secs = limit.as_secs(), "payment gateway timed out");
                ExternalFailure::GatewayTimeout {
                    secs: limit.as_secs(),
                }
            })?
            .map_err(|e| {
                warn!(error = %e, "payment gateway error");
                ExternalFailure::Gateway(e.0)
            })?;

        match outcome {
            PaymentOutcome::Succeeded(confirmation) => {
                info!(payment_id = %confirmation.gateway_payment_id, "payment collected");
                Ok(CollectedPayment {
                    order_number: request.order_number,
                    total: record.total,
                    amount,
                    confirmation,
                })
            }
            PaymentOutcome::Failed { reason } => {
                warn!(%reason, "payment declined");
                Err(ExternalFailure::PaymentDeclined(reason).into())
            }
            PaymentOutcome::Cancelled { reason } => {
                info!(%reason, "payment cancelled by customer");
                Err(ExternalFailure::PaymentCancelled(reason).into())
            }
        }
    }
}

impl PlacedOrder {
    #[must_use]
    pub const fn order_number(&self) -> &OrderNumber {
        &self.record.order_number
    }
}
