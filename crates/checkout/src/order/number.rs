//! Customer-facing order numbers.

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Order number of the form `ORD-<unix millis>-<4 random digits>`.
///
/// Collisions need two orders in the same millisecond drawing the same
/// suffix. The order store's unique constraint rejects the rare duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    #[must_use]
    pub fn generate(prefix: &str, now: DateTime<Utc>) -> Self {
        let suffix: u16 = rand::rng().random_range(1000..10_000);
        Self(format!("{prefix}-{}-{suffix}", now.timestamp_millis()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
