//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod pincode;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, MinorUnitsError, format_amount, round_currency, to_minor_units};
pub use phone::{Phone, PhoneError};
pub use pincode::{Pincode, PincodeError};
pub use status::*;
