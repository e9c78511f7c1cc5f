//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC` and carried as [`Decimal`] so that a cart
//! line total (`price × quantity`) is exact. On the wire they are plain JSON
//! numbers, which is what the storefront frontend expects.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Quantity;

/// A unit or line price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units at this price.
    #[must_use]
    pub fn line_total(&self, quantity: Quantity) -> Self {
        Self(self.0 * Decimal::from(quantity.get()))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_line_total_is_exact() {
        let price = Price::new(Decimal::from_str("19.99").unwrap());
        let total = price.line_total(Quantity::new(3).unwrap());
        assert_eq!(total.amount(), Decimal::from_str("59.97").unwrap());
    }

    #[test]
    fn test_price_json_is_a_number() {
        let price: Price = serde_json::from_str("590.5").unwrap();
        assert_eq!(price.amount(), Decimal::from_str("590.5").unwrap());
        assert_eq!(serde_json::to_string(&price).unwrap(), "590.5");
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::from(12));
        assert_eq!(price.to_string(), "12.00");
    }
}
