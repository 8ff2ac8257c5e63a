//! Checkout steps.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The four checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Contact = 1,
    Address = 2,
    Payment = 3,
    Summary = 4,
}

impl CheckoutStep {
    pub const FIRST: Self = Self::Contact;
    pub const LAST: Self = Self::Summary;

    /// 1-indexed step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Contact),
            2 => Some(Self::Address),
            3 => Some(Self::Payment),
            4 => Some(Self::Summary),
            _ => None,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Contact => None,
            Self::Address => Some(Self::Contact),
            Self::Payment => Some(Self::Address),
            Self::Summary => Some(Self::Payment),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Address => "address",
            Self::Payment => "payment",
            Self::Summary => "summary",
        }
    }

    /// Heading shown to customers.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Address => "Address",
            Self::Payment => "Payment",
            Self::Summary => "Summary",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_order() {
        let mut step = CheckoutStep::FIRST;
        let mut seen = vec![step];
        while let Some(next) = step.next() {
            assert_eq!(next.previous(), Some(step));
            step = next;
            seen.push(step);
        }
        assert_eq!(step, CheckoutStep::LAST);
        assert_eq!(seen.len(), 4);
        assert!(CheckoutStep::Contact < CheckoutStep::Summary);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(CheckoutStep::Payment.number(), 3);
        assert_eq!(CheckoutStep::from_number(2), Some(CheckoutStep::Address));
        assert_eq!(CheckoutStep::from_number(0), None);
        assert_eq!(CheckoutStep::from_number(5), None);
    }
}
