//! Status enums for catalog entities.

use serde::{Deserialize, Serialize};

/// Publication status of a product.
///
/// Stored as a `SMALLINT` (`0` inactive, `1` active). Only active products
/// with stock on hand are offered to shoppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Inactive = 0,
    Active = 1,
}

impl ProductStatus {
    /// Whether a product with this status and stock count can be sold.
    #[must_use]
    pub const fn is_available(self, in_stock: i32) -> bool {
        matches!(self, Self::Active) && in_stock > 0
    }

    /// The stored `SMALLINT` value.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self as i16
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" | "0" => Ok(Self::Inactive),
            "active" | "1" => Ok(Self::Active),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}
