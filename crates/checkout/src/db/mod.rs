//! `PostgreSQL` implementations of the checkout stores.
//!
//! # Tables
//!
//! - `store_settings` - key/value commerce settings (`JSONB` values)
//! - `coupons` - discount coupons, `used_count` bumped after each order
//! - `orders` - placed orders, unique on `order_number`
//!
//! # Migrations
//!
//! Migrations live in `crates/checkout/migrations/` and are applied with
//! [`run_migrations`].

mod coupons;
mod orders;
mod settings;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::CheckoutConfig;
use crate::store::StoreError;

pub use coupons::PgCouponStore;
pub use orders::PgOrderStore;
pub use settings::PgSettingsProvider;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order number).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::Unavailable(e.to_string()),
            RepositoryError::DataCorruption(msg) => Self::DataCorruption(msg),
            RepositoryError::NotFound => Self::Unavailable("record not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool for the database URL in `config`.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if no database URL is configured, or
/// the connection error.
pub async fn create_pool_from_config(config: &CheckoutConfig) -> Result<PgPool, sqlx::Error> {
    let url = config.database_url.as_ref().ok_or_else(|| {
        sqlx::Error::Configuration("CHECKOUT_DATABASE_URL or DATABASE_URL must be set".into())
    })?;
    create_pool(url).await
}

/// Apply the checkout schema migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running checkout migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Checkout migrations complete");
    Ok(())
}
