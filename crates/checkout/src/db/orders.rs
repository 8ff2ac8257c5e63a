//! Order persistence.

use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use threadline_core::OrderId;

use super::RepositoryError;
use crate::order::OrderRecord;
use crate::store::{OrderStore, StoreError};

/// Order repository over the `orders` table.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a placed order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip_all, fields(order_number = %order.order_number))]
    pub async fn create(&self, order: &OrderRecord) -> Result<OrderId, RepositoryError> {
        let id = OrderId::generate();
        sqlx::query(
            r"
            INSERT INTO orders (
                id, order_number, customer_name, customer_email, customer_phone,
                shipping_address, items, subtotal, tax, delivery_fee, cod_fee,
                discount, total, coupon_code, coupon_id, payment_method,
                payment_status, order_status, gateway_order_id, gateway_payment_id,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            ",
        )
        .bind(id.as_uuid())
        .bind(order.order_number.as_str())
        .bind(&order.customer_name)
        .bind(order.customer_email.as_str())
        .bind(order.customer_phone.as_str())
        .bind(Json(&order.shipping_address))
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.delivery_fee)
        .bind(order.cod_fee)
        .bind(order.discount)
        .bind(order.total)
        .bind(order.coupon_code.as_deref())
        .bind(order.coupon_id.map(|c| c.as_uuid()))
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.gateway_order_id.as_deref())
        .bind(order.gateway_payment_id.as_deref())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order number {} already exists",
                    order.order_number
                ));
            }
            RepositoryError::Database(e)
        })?;

        Ok(id)
    }
}

impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &OrderRecord) -> Result<OrderId, StoreError> {
        Ok(self.create(order).await?)
    }
}
