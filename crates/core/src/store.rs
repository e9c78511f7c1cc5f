//! Store capability traits.
//!
//! [`CatalogStore`] is the data surface consumed by the HTTP layer;
//! [`ConnectionLifecycle`] is the supervision surface driven by the
//! liveness monitor. Both are object-safe so the server can hold an
//! `Arc<dyn Store>` and swap in the in-memory implementation for tests.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::context::OpContext;
use crate::error::StoreResult;
use crate::models::{
    AboutPage, Branch, Brand, BrandInput, CartItem, CartUpsert, Product, ProductInput,
};
use crate::types::{BrandId, CartId, ProductId, Quantity};

/// Queries and commands against the catalog tables.
///
/// Single-entity reads fail with `StoreError::NotFound` when nothing
/// matches; bulk reads return an empty `Vec` instead. Updates and deletes
/// return the number of affected rows and do not treat zero as an error.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Products

    async fn get_product(&self, ctx: &OpContext, id: ProductId) -> StoreResult<Product>;

    async fn list_products(&self, ctx: &OpContext) -> StoreResult<Vec<Product>>;

    async fn products_by_category(
        &self,
        ctx: &OpContext,
        category: &str,
    ) -> StoreResult<Vec<Product>>;

    async fn products_by_brand(&self, ctx: &OpContext, brand_id: i32)
    -> StoreResult<Vec<Product>>;

    /// Case-insensitive substring search over product name and description.
    async fn search_products(&self, ctx: &OpContext, query: &str) -> StoreResult<Vec<Product>>;

    /// Insert a product. Returns the input; the assigned ID is not reported.
    async fn add_product(&self, ctx: &OpContext, input: ProductInput)
    -> StoreResult<ProductInput>;

    async fn update_product(
        &self,
        ctx: &OpContext,
        id: ProductId,
        input: ProductInput,
    ) -> StoreResult<u64>;

    async fn delete_product(&self, ctx: &OpContext, id: ProductId) -> StoreResult<u64>;

    // About pages & branches

    async fn about_page_by_brand(&self, ctx: &OpContext, brand_id: i32) -> StoreResult<AboutPage>;

    async fn list_branches(&self, ctx: &OpContext) -> StoreResult<Vec<Branch>>;

    async fn branches_by_brand(&self, ctx: &OpContext, brand_id: i32) -> StoreResult<Vec<Branch>>;

    async fn branches_by_brand_and_province(
        &self,
        ctx: &OpContext,
        brand_id: i32,
        province: &str,
    ) -> StoreResult<Vec<Branch>>;

    // Brands

    async fn get_brand(&self, ctx: &OpContext, id: &BrandId) -> StoreResult<Brand>;

    async fn list_brands(&self, ctx: &OpContext) -> StoreResult<Vec<Brand>>;

    /// Insert a brand. Returns the input; the assigned ID is not reported.
    async fn add_brand(&self, ctx: &OpContext, input: BrandInput) -> StoreResult<BrandInput>;

    async fn update_brand(
        &self,
        ctx: &OpContext,
        id: &BrandId,
        input: BrandInput,
    ) -> StoreResult<u64>;

    async fn delete_brand(&self, ctx: &OpContext, id: &BrandId) -> StoreResult<u64>;

    // Cart

    /// All cart lines joined with product name and image, priced at the
    /// product's current price × quantity.
    async fn list_cart(&self, ctx: &OpContext) -> StoreResult<Vec<CartItem>>;

    /// Atomically insert a cart line for `product_id` (snapshotting the
    /// current product price) or increment the existing line's quantity.
    async fn add_to_cart(
        &self,
        ctx: &OpContext,
        product_id: ProductId,
        quantity: Quantity,
    ) -> StoreResult<CartUpsert>;

    async fn remove_from_cart(&self, ctx: &OpContext, cart_id: CartId) -> StoreResult<u64>;
}

/// Connection supervision.
#[async_trait]
pub trait ConnectionLifecycle: Send + Sync {
    /// Lightweight liveness probe against the active connection.
    async fn ping(&self) -> StoreResult<()>;

    /// Establish a new connection and, only if its probe succeeds, replace
    /// the active one. On failure the active connection is left untouched.
    async fn reconnect(&self, connection_string: &SecretString) -> StoreResult<()>;

    /// Release all pooled connections.
    async fn close(&self);
}

/// A complete store: data operations plus lifecycle.
pub trait Store: CatalogStore + ConnectionLifecycle {}

impl<T: CatalogStore + ConnectionLifecycle> Store for T {}
