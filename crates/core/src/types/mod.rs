//! Core types for the clothes catalog.
//!
//! This module provides type-safe wrappers for identities, prices and
//! quantities.

pub mod brand;
pub mod id;
pub mod price;
pub mod quantity;

pub use brand::BrandId;
pub use id::*;
pub use price::Price;
pub use quantity::Quantity;
