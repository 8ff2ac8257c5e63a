//! Cart lines and the simple collection edits the storefront performs.
//!
//! A line is identified by `(product_id, selected_size)`: the same shirt in
//! M and L is two lines, never merged. Prices and quantities are validated
//! here, on the way in, so pricing can rely on `unit_price > 0` and
//! `quantity >= 1` without re-checking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use threadline_core::ProductId;

/// Size recorded for products without size variants.
pub const DEFAULT_SIZE: &str = "Standard";

/// Errors from cart edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product {product_id} has an invalid price")]
    InvalidPrice { product_id: ProductId },
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("product {product_id} in size {size} is not in the cart")]
    LineNotFound { product_id: ProductId, size: String },
}

/// One product/size entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub selected_size: String,
    pub image_ref: Option<String>,
}

impl CartLine {
    /// A single unit of a product in the default size.
    #[must_use]
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity: 1,
            selected_size: DEFAULT_SIZE.to_owned(),
            image_ref: None,
        }
    }

    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Blank sizes fall back to [`DEFAULT_SIZE`].
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.selected_size = normalize_size(&size.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.selected_size == size
    }
}

fn normalize_size(size: &str) -> String {
    let size = size.trim();
    if size.is_empty() {
        DEFAULT_SIZE.to_owned()
    } else {
        size.to_owned()
    }
}

/// The customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add a line, merging quantities with an existing line of the same
    /// product and size.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidPrice`] for non-positive prices and
    /// [`CartError::InvalidQuantity`] for a zero quantity.
    pub fn add(&mut self, mut line: CartLine) -> Result<(), CartError> {
        if line.unit_price <= Decimal::ZERO {
            return Err(CartError::InvalidPrice {
                product_id: line.product_id,
            });
        }
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        line.selected_size = normalize_size(&line.selected_size);

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(line.product_id, &line.selected_size))
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
        Ok(())
    }

    /// Remove the line for a product and size.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn remove(&mut self, product_id: ProductId, size: &str) -> Result<CartLine, CartError> {
        let size = normalize_size(size);
        let index = self
            .lines
            .iter()
            .position(|l| l.matches(product_id, &size))
            .ok_or(CartError::LineNotFound { product_id, size })?;
        Ok(self.lines.remove(index))
    }

    /// Set a line's quantity. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id, size).map(|_| ());
        }
        let size = normalize_size(size);
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, &size))
            .ok_or(CartError::LineNotFound { product_id, size })?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Distinct products in the cart, in first-added order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }
}
