//! Core types for the shopbot catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{CurrencyCode, DiscountError, DiscountPercent, Price};
pub use status::*;
