//! Coupon lookups and usage counting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use threadline_core::{CouponId, ProductId};

use super::RepositoryError;
use crate::coupon::{Coupon, CouponScope, DiscountType, normalize_code};
use crate::store::{CouponStore, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_type: String,
    discount_value: Decimal,
    min_order_amount: Option<Decimal>,
    max_discount_amount: Option<Decimal>,
    usage_limit: Option<i32>,
    used_count: i32,
    is_active: bool,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    product_ids: Option<Vec<Uuid>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_type = match row.discount_type.as_str() {
            "percentage" => DiscountType::Percentage,
            "fixed" => DiscountType::Fixed,
            other => {
                return Err(RepositoryError::DataCorruption(format!(
                    "unknown discount type in database: {other}"
                )));
            }
        };
        let count = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative {column} in database: {value}"))
            })
        };
        let scope = match row.product_ids {
            Some(ids) if !ids.is_empty() => {
                CouponScope::Products(ids.into_iter().map(ProductId::new).collect())
            }
            _ => CouponScope::AllProducts,
        };

        Ok(Self {
            id: CouponId::new(row.id),
            code: row.code,
            discount_type,
            discount_value: row.discount_value,
            min_order_amount: row.min_order_amount,
            max_discount_amount: row.max_discount_amount,
            usage_limit: row.usage_limit.map(|l| count(l, "usage_limit")).transpose()?,
            used_count: count(row.used_count, "used_count")?,
            is_active: row.is_active,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            scope,
        })
    }
}

/// Coupon repository over the `coupons` table.
#[derive(Debug, Clone)]
pub struct PgCouponStore {
    pool: PgPool,
}

impl PgCouponStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a coupon by code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row can't be decoded.
    #[instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(
            r"
            SELECT id, code, discount_type, discount_value, min_order_amount,
                   max_discount_amount, usage_limit, used_count, is_active,
                   valid_from, valid_until, product_ids
            FROM coupons
            WHERE code = $1
            ",
        )
        .bind(normalize_code(code))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Increment `used_count` by one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn record_use(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl CouponStore for PgCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        Ok(self.get_by_code(code).await?)
    }

    async fn increment_usage(&self, id: CouponId) -> Result<(), StoreError> {
        Ok(self.record_use(id).await?)
    }
}
