//! Postal code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    /// The input string is empty.
    #[error("Pincode is required")]
    Empty,
    /// The input is not made of exactly the expected number of digits.
    #[error("Pincode must be {expected} digits")]
    Invalid {
        /// Digits required for the delivery locale.
        expected: usize,
    },
}

/// A postal code for the delivery locale (six digits in India).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Pincode(String);

impl Pincode {
    /// Parse a pincode that must be exactly `digits` ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`PincodeError::Empty`] for blank input and
    /// [`PincodeError::Invalid`] for anything else that isn't `digits` digits.
    pub fn parse(s: &str, digits: usize) -> Result<Self, PincodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PincodeError::Empty);
        }
        if s.len() != digits || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PincodeError::Invalid { expected: digits });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the pincode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
