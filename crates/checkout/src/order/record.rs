//! The immutable order record handed to the order store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use threadline_core::{
    AddressId, AddressType, CouponId, Email, OrderStatus, PaymentMethod, PaymentStatus, Phone,
    ProductId,
};

use super::OrderNumber;
use crate::cart::CartLine;
use crate::checkout::{
    AddressDetails, CheckoutDraft, CheckoutPolicy, validate_address, validate_contact,
};
use crate::error::ValidationError;
use crate::gateway::PaymentConfirmation;
use crate::pricing::PricedOrder;

/// A cart line frozen at the moment of ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub selected_size: String,
    pub image_ref: Option<String>,
    pub line_total: Decimal,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            selected_size: line.selected_size.clone(),
            image_ref: line.image_ref.clone(),
            line_total: line.line_total(),
        }
    }
}

/// Delivery address as recorded on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub plot_number: String,
    pub building_name: Option<String>,
    pub street: String,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub address_type: AddressType,
    pub save_as: Option<String>,
    pub saved_address_id: Option<AddressId>,
}

impl From<&AddressDetails> for ShippingAddress {
    fn from(address: &AddressDetails) -> Self {
        Self {
            plot_number: address.plot_number.trim().to_owned(),
            building_name: non_blank(&address.building_name),
            street: address.street.trim().to_owned(),
            landmark: non_blank(&address.landmark),
            city: address.city.trim().to_owned(),
            state: address.state.trim().to_owned(),
            pincode: address.pincode.trim().to_owned(),
            address_type: address.address_type,
            save_as: non_blank(&address.save_as),
            saved_address_id: address.use_saved_address,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Everything the order store persists for one order.
///
/// Amounts are rounded to two places; `total` equals the rounded components
/// combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: Phone,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub cod_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    /// Set only when the coupon actually reduced the total.
    pub coupon_code: Option<String>,
    pub coupon_id: Option<CouponId>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Build the pre-payment record for a draft.
    ///
    /// The record starts out `pending` on both payment and fulfilment.
    ///
    /// # Errors
    ///
    /// Returns the contact or address problem if the draft no longer passes
    /// its gates.
    pub fn assemble(
        order_number: OrderNumber,
        draft: &CheckoutDraft,
        priced: &PricedOrder,
        lines: &[CartLine],
        policy: &CheckoutPolicy,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let contact = validate_contact(&draft.customer, policy)?;
        validate_address(&draft.address, policy)?;

        let amounts = priced.rounded();
        let coupon = draft
            .applied_coupon
            .as_ref()
            .filter(|_| amounts.discount > Decimal::ZERO);

        Ok(Self {
            order_number,
            customer_name: contact.name,
            customer_email: contact.email,
            customer_phone: contact.phone,
            shipping_address: ShippingAddress::from(&draft.address),
            items: lines.iter().map(OrderLine::from).collect(),
            subtotal: amounts.subtotal,
            tax: amounts.tax,
            delivery_fee: amounts.delivery_fee,
            cod_fee: amounts.cod_fee,
            discount: amounts.discount,
            total: amounts.total,
            coupon_code: coupon.map(|c| c.code.clone()),
            coupon_id: coupon.map(|c| c.id),
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            gateway_order_id: None,
            gateway_payment_id: None,
            created_at,
        })
    }

    /// Attach a successful gateway payment.
    pub fn finalize_payment(&mut self, confirmation: &PaymentConfirmation) {
        self.payment_status = PaymentStatus::Paid;
        self.order_status = OrderStatus::Confirmed;
        self.gateway_order_id = Some(confirmation.gateway_order_id.clone());
        self.gateway_payment_id = Some(confirmation.gateway_payment_id.clone());
    }

    /// Total units ordered.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}
