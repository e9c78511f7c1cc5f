//! Catalog entities.
//!
//! Serde field names follow the JSON contract of the storefront frontend,
//! which predates this crate (`imgsrc`, `isnew`, `banch`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{AboutPageId, BranchId, BrandId, CartId, Price, ProductId, Quantity};

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category: String,
    #[serde(rename = "imgsrc")]
    pub image: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "brand")]
    pub brand_id: i32,
    pub price: Price,
    #[serde(rename = "isnew")]
    pub is_new: bool,
    #[serde(rename = "createdate")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedate")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Case-insensitive substring match against name or description.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// The writable fields of a product, used for both insert and full-row update.
///
/// Unknown fields (such as an `id` sent by the client) are ignored; identity
/// is always taken from the path or assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub category: String,
    #[serde(rename = "imgsrc", default)]
    pub image: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "brand")]
    pub brand_id: i32,
    pub price: Price,
    #[serde(rename = "isnew", default)]
    pub is_new: bool,
}

// =============================================================================
// Brands
// =============================================================================

/// A brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    #[serde(rename = "brandname")]
    pub name: String,
    #[serde(rename = "brandlogo")]
    pub logo: String,
}

/// The writable fields of a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandInput {
    #[serde(rename = "brandname")]
    pub name: String,
    #[serde(rename = "brandlogo", default)]
    pub logo: String,
}

// =============================================================================
// About pages & branches
// =============================================================================

/// The "about" page of a brand. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutPage {
    pub id: AboutPageId,
    pub brand_id: i32,
    #[serde(rename = "img")]
    pub image: String,
    pub title: String,
    pub description: String,
}

/// A physical branch (shop) of a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub brand_id: i32,
    pub province: String,
    #[serde(rename = "banch")]
    pub name: String,
    #[serde(rename = "banch_location")]
    pub location: String,
}

// =============================================================================
// Cart
// =============================================================================

/// A cart line, joined with the product it refers to.
///
/// `price` is the line total (current product price × quantity), computed
/// when the cart is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    #[serde(rename = "name")]
    pub product_name: String,
    #[serde(rename = "imgsrc")]
    pub product_image: String,
    pub quantity: Quantity,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for adding a product to the cart.
///
/// The quantity is kept raw so that a non-positive value surfaces as a
/// validation error rather than a body-decoding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl AddToCart {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the quantity is not positive.
    pub fn validate(self) -> Result<(ProductId, Quantity), StoreError> {
        Ok((self.product_id, Quantity::new(self.quantity)?))
    }
}

/// What the cart upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartUpsert {
    /// A new line was created with the product's current price.
    Inserted,
    /// The existing line's quantity was incremented.
    Incremented,
}
