//! External data-store contracts.
//!
//! The hosted table store is an external collaborator: the checkout only
//! needs "look up a coupon", "bump a coupon's usage by one" and "insert an
//! order". Implementations live behind these traits so the engine can be
//! exercised without a database; `db` provides the `PostgreSQL` versions.

use std::future::Future;

use thiserror::Error;
use threadline_core::{CouponId, OrderId};

use crate::coupon::Coupon;
use crate::order::OrderRecord;

/// Failure reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Stored data could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Read access to coupons plus the single usage-increment write.
pub trait CouponStore {
    /// Find a coupon by its normalized (uppercase) code.
    ///
    /// Inactive and expired coupons are returned too; the validator decides
    /// what to tell the customer about them.
    fn find_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Coupon>, StoreError>> + Send;

    /// Atomically increment `used_count` by one.
    fn increment_usage(&self, id: CouponId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence for placed orders.
pub trait OrderStore {
    /// Insert one order record, returning its stored id.
    ///
    /// A failed insert leaves nothing behind. Implementations must reject a
    /// duplicate order number with [`StoreError::Conflict`].
    fn insert(
        &self,
        order: &OrderRecord,
    ) -> impl Future<Output = Result<OrderId, StoreError>> + Send;
}
