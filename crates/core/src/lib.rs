//! Threadline Core - Shared types library.
//!
//! This crate provides the value types used across the Threadline checkout
//! components:
//! - `checkout` - Pricing, coupons, the checkout state machine and order assembly
//! - `integration-tests` - Scenario tests over the checkout pipeline
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, phone numbers,
//!   pincodes and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
