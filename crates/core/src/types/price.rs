//! Price, discount, and currency types.
//!
//! Catalog prices are whole currency units stored as `INTEGER`; there is no
//! minor-unit handling. Discounts are whole percentages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currency used when a product row has none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A catalog price in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i32);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: i32) -> Self {
        Self(amount)
    }

    /// Get the amount in whole units.
    #[must_use]
    pub const fn amount(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error constructing a [`DiscountPercent`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discount must be between 0 and 100 percent (got {0})")]
pub struct DiscountError(pub i32);

/// A discount percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    /// No discount.
    pub const NONE: Self = Self(0);

    /// Create a discount, rejecting values outside `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError` if `percent` is negative or above 100.
    pub fn new(percent: i32) -> Result<Self, DiscountError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or(DiscountError(percent))
    }

    /// Get the percentage.
    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for DiscountPercent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency code as stored on the product row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Build a currency code from an optional stored value.
    ///
    /// Missing or blank values fall back to [`DEFAULT_CURRENCY`].
    #[must_use]
    pub fn from_stored(value: Option<String>) -> Self {
        match value {
            Some(code) if !code.trim().is_empty() => Self(code.trim().to_uppercase()),
            _ => Self::default(),
        }
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
