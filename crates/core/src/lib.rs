//! Domain core for the club booking backend.
//!
//! This crate has zero internal dependencies so the repository layer, the
//! notification crate and the HTTP server can all share the same booking
//! rules: status machine, pricing tiers, availability math and input
//! validation.

pub mod availability;
pub mod booking;
pub mod booking_code;
pub mod dates;
pub mod error;
pub mod pricing;
pub mod roles;
pub mod types;
pub mod validation;
