//! Commerce settings stored as `JSONB` key/value rows.

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use crate::settings::{SettingsProvider, SettingsSnapshot};
use crate::store::StoreError;

/// Reads the `store_settings` table.
#[derive(Debug, Clone)]
pub struct PgSettingsProvider {
    pool: PgPool,
}

impl PgSettingsProvider {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch every settings row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<SettingsSnapshot, RepositoryError> {
        let rows: Vec<(String, JsonValue)> =
            sqlx::query_as("SELECT key, value FROM store_settings")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    /// Insert or replace one setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl SettingsProvider for PgSettingsProvider {
    async fn fetch(&self) -> Result<SettingsSnapshot, StoreError> {
        Ok(self.all().await?)
    }
}
