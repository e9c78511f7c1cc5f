//! Cart quantity.

use core::fmt;

use serde::{Serialize, Serializer};

use crate::error::StoreError;

/// A strictly positive number of units added to (or held in) the cart.
///
/// The cart upsert only accepts a `Quantity`, so zero or negative values are
/// rejected while the request is still being decoded and can never reach a
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(i32);

impl Quantity {
    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if `value` is not greater than zero or
    /// does not fit the `integer` column of the cart table.
    pub fn new(value: i64) -> Result<Self, StoreError> {
        if value <= 0 {
            return Err(StoreError::Validation(
                "quantity must be greater than 0".to_owned(),
            ));
        }

        i32::try_from(value).map(Self).map_err(|_| {
            StoreError::Validation(format!("quantity must be at most {}", i32::MAX))
        })
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = StoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.0)
    }
}
