//! Customer phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("Phone number is required")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("Phone number may only contain digits")]
    NonDigit,
    /// The number of digits does not match the store's policy.
    #[error("Phone number must be {expected} digits")]
    WrongLength {
        /// Digits required by the policy.
        expected: usize,
        /// Digits found in the input.
        actual: usize,
    },
}

/// A phone number normalized to its digits.
///
/// Spaces and dashes are accepted as separators and stripped; anything else
/// that isn't an ASCII digit is rejected. The digit count is a policy of the
/// store (ten for Indian mobile numbers) and is passed in by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number that must contain exactly `digits` digits.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] for empty input, non-digit characters or a
    /// digit count different from `digits`.
    pub fn parse(s: &str, digits: usize) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut normalized = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '0'..='9' => normalized.push(c),
                ' ' | '-' => {}
                _ => return Err(PhoneError::NonDigit),
            }
        }

        if normalized.len() != digits {
            return Err(PhoneError::WrongLength {
                expected: digits,
                actual: normalized.len(),
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
