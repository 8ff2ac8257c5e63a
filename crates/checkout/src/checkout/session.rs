//! One checkout attempt.
//!
//! A [`CheckoutSession`] owns the draft, the settings snapshot it was started
//! with and the submission state. The cart is passed in on every call rather
//! than held, so pricing always reflects the cart as it is now.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use threadline_core::{PaymentMethod, format_amount, to_minor_units};
use tracing::{debug, warn};

use super::draft::{AddressDetails, CheckoutDraft, CustomerInfo};
use super::gates::{
    CheckoutPolicy, ValidContact, validate_address, validate_contact, validate_order_amount,
    validate_payment_method,
};
use super::step::CheckoutStep;
use crate::cart::Cart;
use crate::coupon::{self, Coupon};
use crate::error::{CheckoutError, ExternalFailure, StateError, ValidationError};
use crate::gateway::CollectedPayment;
use crate::order::OrderNumber;
use crate::pricing::{self, PricedOrder};
use crate::settings::CommerceSettings;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting edits and navigation.
    Open,
    /// An order submission is in flight.
    Submitting,
    /// The order was stored. The session is finished.
    Placed,
    /// The cart emptied out from under the session.
    Abandoned,
}

/// A single checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    settings: CommerceSettings,
    policy: CheckoutPolicy,
    draft: CheckoutDraft,
    state: SessionState,
    pending_order_number: Option<OrderNumber>,
    pending_payment: Option<CollectedPayment>,
}

impl CheckoutSession {
    /// Start a checkout for `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCart`] if there is nothing to buy.
    pub fn start(
        settings: CommerceSettings,
        policy: CheckoutPolicy,
        cart: &Cart,
    ) -> Result<Self, ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        Ok(Self {
            settings,
            policy,
            draft: CheckoutDraft::default(),
            state: SessionState::Open,
            pending_order_number: None,
            pending_payment: None,
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &CommerceSettings {
        &self.settings
    }

    #[must_use]
    pub const fn policy(&self) -> &CheckoutPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn current_step(&self) -> CheckoutStep {
        self.draft.current_step
    }

    /// Order number reserved by an earlier, unsuccessful submission.
    #[must_use]
    pub const fn pending_order_number(&self) -> Option<&OrderNumber> {
        self.pending_order_number.as_ref()
    }

    /// Online payment taken by an earlier submission whose order was not
    /// stored.
    #[must_use]
    pub const fn collected_payment(&self) -> Option<&CollectedPayment> {
        self.pending_payment.as_ref()
    }

    // -------------------------------------------------------------------------
    // Draft edits
    // -------------------------------------------------------------------------

    /// Replace the contact details. Only allowed on the contact step.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if another step is active or the session is
    /// not open.
    pub fn set_customer(&mut self, customer: CustomerInfo) -> Result<(), StateError> {
        self.ensure_editing("Contact details", CheckoutStep::Contact)?;
        self.draft.customer = customer;
        Ok(())
    }

    /// Replace the delivery address. Only allowed on the address step.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if another step is active or the session is
    /// not open.
    pub fn set_address(&mut self, address: AddressDetails) -> Result<(), StateError> {
        self.ensure_editing("Delivery address", CheckoutStep::Address)?;
        self.draft.address = address;
        Ok(())
    }

    /// Choose how to pay. Only allowed on the payment step.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if another step is active or the session is
    /// not open.
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), StateError> {
        self.ensure_editing("Payment method", CheckoutStep::Payment)?;
        self.draft.payment_method = method;
        Ok(())
    }

    /// Apply a coupon the store returned for `code`, replacing any current
    /// coupon. On rejection the previously applied coupon is kept.
    ///
    /// Returns the discount the coupon grants on the current cart.
    ///
    /// # Errors
    ///
    /// Returns the coupon rejection, or a [`StateError`] if the session is not
    /// open.
    pub fn apply_coupon(
        &mut self,
        code: &str,
        coupon: Option<Coupon>,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CheckoutError> {
        self.ensure_open()?;
        let discount = coupon::validate(code, cart.subtotal(), coupon.as_ref(), cart.lines(), now)
            .into_result()?;
        debug!(code = %coupon::normalize_code(code), %discount, "coupon applied");
        self.draft.applied_coupon = coupon;
        Ok(discount)
    }

    /// Drop the applied coupon. The store's usage count is not touched.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the session is not open.
    pub fn remove_coupon(&mut self) -> Result<(), StateError> {
        self.ensure_open()?;
        self.draft.applied_coupon = None;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Discount from the applied coupon on the current cart, or zero if the
    /// coupon no longer validates.
    #[must_use]
    pub fn coupon_discount(&self, cart: &Cart, now: DateTime<Utc>) -> Decimal {
        self.draft.applied_coupon.as_ref().map_or(Decimal::ZERO, |c| {
            coupon::validate(&c.code, cart.subtotal(), Some(c), cart.lines(), now).discount_amount
        })
    }

    /// Price `cart` with the draft's payment method and coupon.
    #[must_use]
    pub fn priced(&self, cart: &Cart, now: DateTime<Utc>) -> PricedOrder {
        pricing::price(
            cart.lines(),
            &self.settings,
            self.draft.payment_method,
            self.coupon_discount(cart, now),
        )
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Move to the next step if the current step's gate passes.
    ///
    /// # Errors
    ///
    /// Returns the first validation problem, [`StateError::NoNextStep`] on the
    /// summary step, or [`ValidationError::EmptyCart`] (which also abandons
    /// the session).
    pub fn advance(
        &mut self,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        self.abandon_if_empty(cart)?;

        let current = self.current_step();
        let next = current.next().ok_or(StateError::NoNextStep(current))?;

        let priced = self.priced(cart, now);
        validate_order_amount(&priced, &self.settings)?;
        match current {
            CheckoutStep::Contact => {
                validate_contact(&self.draft.customer, &self.policy)?;
            }
            CheckoutStep::Address => validate_address(&self.draft.address, &self.policy)?,
            CheckoutStep::Payment => {
                validate_payment_method(self.draft.payment_method, &priced, &self.settings)?;
            }
            CheckoutStep::Summary => {}
        }

        debug!(from = %current, to = %next, "checkout step advanced");
        self.draft.current_step = next;
        Ok(next)
    }

    /// Move back one step. Data entered on later steps is kept.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoPreviousStep`] on the first step.
    pub fn go_back(&mut self) -> Result<CheckoutStep, StateError> {
        self.ensure_open()?;
        let current = self.current_step();
        let previous = current
            .previous()
            .ok_or(StateError::NoPreviousStep(current))?;
        self.draft.current_step = previous;
        Ok(previous)
    }

    /// Jump to `target`.
    ///
    /// Any earlier step can be revisited. Moving forward is only possible one
    /// step at a time, through the same gate as [`advance`](Self::advance).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SkippedStep`] when `target` is more than one step
    /// ahead, or the gate's error when moving forward.
    pub fn go_to(
        &mut self,
        target: CheckoutStep,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        let current = self.current_step();
        if target <= current {
            self.draft.current_step = target;
            return Ok(target);
        }
        if current.next() != Some(target) {
            return Err(StateError::SkippedStep {
                from: current,
                to: target,
            }
            .into());
        }
        self.advance(cart, now)
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// Re-run every gate against the current cart, as placement does.
    ///
    /// # Errors
    ///
    /// Returns the first problem found. The session is left unchanged.
    pub fn validate_for_placement(
        &self,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> Result<(ValidContact, PricedOrder), CheckoutError> {
        self.ensure_open()?;
        if self.current_step() != CheckoutStep::Summary {
            return Err(StateError::NotAtSummary.into());
        }
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let contact = validate_contact(&self.draft.customer, &self.policy)?;
        validate_address(&self.draft.address, &self.policy)?;

        if let Some(applied) = &self.draft.applied_coupon {
            coupon::validate(&applied.code, cart.subtotal(), Some(applied), cart.lines(), now)
                .into_result()?;
        }

        let priced = self.priced(cart, now);
        validate_order_amount(&priced, &self.settings)?;
        validate_payment_method(self.draft.payment_method, &priced, &self.settings)?;
        Ok((contact, priced))
    }

    /// Validate for placement and lock the session for submission.
    ///
    /// The returned guard reserves an order number, reusing the one from a
    /// previous failed attempt. Dropping the guard without calling
    /// [`Submission::complete`] reopens the session at the summary step.
    ///
    /// If an earlier attempt already collected an online payment, the order
    /// must still be paid online for exactly that amount.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SubmissionInFlight`] while another submission
    /// holds the lock, [`ValidationError::PaymentAlreadyCollected`] when the
    /// order drifted from a payment already taken, or any placement
    /// validation error.
    pub fn begin_submission(
        &mut self,
        cart: &Cart,
        order_prefix: &str,
        now: DateTime<Utc>,
    ) -> Result<Submission<'_>, CheckoutError> {
        self.ensure_open()?;
        self.abandon_if_empty(cart)?;
        let (contact, priced) = self.validate_for_placement(cart, now)?;

        let order_number = self
            .pending_order_number
            .get_or_insert_with(|| OrderNumber::generate(order_prefix, now))
            .clone();
        if let Some(paid) = &self.pending_payment {
            self.ensure_matches_payment(paid, &order_number, &priced)?;
        }
        self.state = SessionState::Submitting;

        Ok(Submission {
            session: self,
            order_number,
            contact,
            priced,
            completed: false,
        })
    }

    fn ensure_matches_payment(
        &self,
        paid: &CollectedPayment,
        order_number: &OrderNumber,
        priced: &PricedOrder,
    ) -> Result<(), CheckoutError> {
        let amount = to_minor_units(priced.rounded().total).map_err(ExternalFailure::from)?;
        if self.draft.payment_method == PaymentMethod::Online && paid.covers(order_number, amount) {
            return Ok(());
        }
        warn!(
            %order_number,
            paid = paid.amount,
            due = amount,
            method = %self.draft.payment_method,
            "order no longer matches the payment already collected"
        );
        Err(ValidationError::PaymentAlreadyCollected {
            paid: format_amount(&self.settings.currency_symbol, paid.total),
        }
        .into())
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Submitting => Err(StateError::SubmissionInFlight),
            SessionState::Placed | SessionState::Abandoned => Err(StateError::SessionClosed),
        }
    }

    fn ensure_editing(&self, slice: &'static str, owner: CheckoutStep) -> Result<(), StateError> {
        self.ensure_open()?;
        if self.current_step() == owner {
            Ok(())
        } else {
            Err(StateError::StepNotActive {
                slice,
                expected: owner,
            })
        }
    }

    fn abandon_if_empty(&mut self, cart: &Cart) -> Result<(), ValidationError> {
        if cart.is_empty() {
            debug!("cart emptied, abandoning checkout");
            self.state = SessionState::Abandoned;
            return Err(ValidationError::EmptyCart);
        }
        Ok(())
    }
}

/// Exclusive hold on a session while an order is being submitted.
#[derive(Debug)]
pub struct Submission<'a> {
    session: &'a mut CheckoutSession,
    order_number: OrderNumber,
    contact: ValidContact,
    priced: PricedOrder,
    completed: bool,
}

impl Submission<'_> {
    #[must_use]
    pub fn session(&self) -> &CheckoutSession {
        &*self.session
    }

    #[must_use]
    pub fn draft(&self) -> &CheckoutDraft {
        &self.session.draft
    }

    #[must_use]
    pub const fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    #[must_use]
    pub const fn contact(&self) -> &ValidContact {
        &self.contact
    }

    /// Full-precision pricing validated for this submission.
    #[must_use]
    pub const fn priced(&self) -> &PricedOrder {
        &self.priced
    }

    /// Payment already collected by an earlier attempt whose order was not
    /// stored. It was checked against this submission's order number and
    /// total when the submission began.
    #[must_use]
    pub fn pending_payment(&self) -> Option<&CollectedPayment> {
        self.session.pending_payment.as_ref()
    }

    /// Remember a successful payment so a retry does not charge again.
    pub fn record_payment(&mut self, payment: CollectedPayment) {
        self.session.pending_payment = Some(payment);
    }

    /// Give up the reserved order number so the next attempt draws a new one.
    ///
    /// A number that already has a payment collected under it is kept, and
    /// `false` is returned.
    pub fn release_order_number(&mut self) -> bool {
        if self.session.pending_payment.is_some() {
            return false;
        }
        self.session.pending_order_number = None;
        true
    }

    /// Mark the order as stored, closing the session.
    pub fn complete(mut self) {
        self.session.state = SessionState::Placed;
        self.session.pending_order_number = None;
        self.session.pending_payment = None;
        self.completed = true;
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.session.state = SessionState::Open;
        }
    }
}
