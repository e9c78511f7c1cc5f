//! In-process catalog store.
//!
//! Mirrors the observable behaviour of [`PgStore`](super::PgStore) (ordering,
//! not-found semantics, cart upsert, the cart-to-product constraint)
//! without a database. Used by the router and monitor tests, and handy for
//! running the server locally with `DATABASE_URL=memory:`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use clothes_catalog_core::{
    AboutPage, Branch, Brand, BrandId, BrandInput, CartId, CartItem, CartUpsert, CatalogStore,
    ConnectionLifecycle, OpContext, Product, ProductId, ProductInput, Quantity, StoreError,
    StoreResult,
};

/// Connection strings [`MemoryStore::reconnect`] accepts.
pub const MEMORY_URL_SCHEME: &str = "memory:";

#[derive(Debug, Clone)]
struct CartLine {
    cart_id: CartId,
    product_id: ProductId,
    quantity: Quantity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    brands: BTreeMap<i32, Brand>,
    about_pages: Vec<AboutPage>,
    branches: Vec<Branch>,
    cart: BTreeMap<CartId, CartLine>,
    next_product_id: i32,
    next_brand_id: i32,
    next_cart_id: i32,
}

impl Tables {
    fn product_id(&mut self) -> ProductId {
        self.next_product_id += 1;
        ProductId::new(self.next_product_id)
    }

    fn brand_key(&self, id: &BrandId) -> Option<i32> {
        self.brands
            .iter()
            .find(|(_, b)| b.id == *id)
            .map(|(key, _)| *key)
    }
}

/// Catalog store backed by in-memory tables.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    connected: AtomicBool,
    latency: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty, connected store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            connected: AtomicBool::new(true),
            latency: Duration::ZERO,
        }
    }

    /// Delay every catalog operation by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulate losing the database connection. Every operation (and
    /// [`ping`](ConnectionLifecycle::ping)) fails with
    /// `StoreError::Connection` until a successful reconnect.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Whether the simulated connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Seed an about page. About pages are read-only through the store API.
    pub async fn insert_about_page(&self, page: AboutPage) {
        self.tables.lock().await.about_pages.push(page);
    }

    /// Seed a branch. Branches are read-only through the store API.
    pub async fn insert_branch(&self, branch: Branch) {
        self.tables.lock().await.branches.push(branch);
    }

    fn ensure_connected(&self, op: &'static str) -> StoreResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Connection {
                op,
                message: "connection is closed".to_owned(),
            })
        }
    }

    async fn enter(&self, op: &'static str) -> StoreResult<tokio::sync::MutexGuard<'_, Tables>> {
        self.ensure_connected(op)?;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.tables.lock().await)
    }

    async fn filter_products<P>(&self, op: &'static str, pred: P) -> StoreResult<Vec<Product>>
    where
        P: Fn(&Product) -> bool + Send,
    {
        let tables = self.enter(op).await?;
        Ok(tables.products.values().filter(|p| pred(p)).cloned().collect())
    }

    async fn filter_branches<P>(&self, op: &'static str, pred: P) -> StoreResult<Vec<Branch>>
    where
        P: Fn(&Branch) -> bool + Send,
    {
        let tables = self.enter(op).await?;
        let mut branches: Vec<Branch> = tables.branches.iter().filter(|b| pred(b)).cloned().collect();
        branches.sort_by_key(|b| b.id);
        Ok(branches)
    }
}

#[async_trait]
impl ConnectionLifecycle for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.ensure_connected("ping")
    }

    async fn reconnect(&self, connection_string: &SecretString) -> StoreResult<()> {
        if connection_string
            .expose_secret()
            .starts_with(MEMORY_URL_SCHEME)
        {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(StoreError::Connection {
                op: "reconnect",
                message: format!("unsupported connection string, expected `{MEMORY_URL_SCHEME}`"),
            })
        }
    }

    async fn close(&self) {
        self.disconnect();
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_product(&self, ctx: &OpContext, id: ProductId) -> StoreResult<Product> {
        ctx.run("get_product", async {
            let tables = self.enter("get_product").await?;
            tables
                .products
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("product", id))
        })
        .await
    }

    async fn list_products(&self, ctx: &OpContext) -> StoreResult<Vec<Product>> {
        ctx.run("list_products", self.filter_products("list_products", |_| true))
            .await
    }

    async fn products_by_category(
        &self,
        ctx: &OpContext,
        category: &str,
    ) -> StoreResult<Vec<Product>> {
        ctx.run(
            "products_by_category",
            self.filter_products("products_by_category", |p| p.category == category),
        )
        .await
    }

    async fn products_by_brand(
        &self,
        ctx: &OpContext,
        brand_id: i32,
    ) -> StoreResult<Vec<Product>> {
        ctx.run(
            "products_by_brand",
            self.filter_products("products_by_brand", |p| p.brand_id == brand_id),
        )
        .await
    }

    async fn search_products(&self, ctx: &OpContext, query: &str) -> StoreResult<Vec<Product>> {
        ctx.run(
            "search_products",
            self.filter_products("search_products", |p| p.matches(query)),
        )
        .await
    }

    async fn add_product(
        &self,
        ctx: &OpContext,
        input: ProductInput,
    ) -> StoreResult<ProductInput> {
        ctx.run("add_product", async {
            let mut tables = self.enter("add_product").await?;
            let id = tables.product_id();
            let now = Utc::now();
            tables.products.insert(
                id,
                Product {
                    id,
                    category: input.category.clone(),
                    image: input.image.clone(),
                    name: input.name.clone(),
                    description: input.description.clone(),
                    brand_id: input.brand_id,
                    price: input.price,
                    is_new: input.is_new,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(input)
        })
        .await
    }

    async fn update_product(
        &self,
        ctx: &OpContext,
        id: ProductId,
        input: ProductInput,
    ) -> StoreResult<u64> {
        ctx.run("update_product", async {
            let mut tables = self.enter("update_product").await?;
            let Some(product) = tables.products.get_mut(&id) else {
                return Ok(0);
            };
            product.category = input.category;
            product.image = input.image;
            product.name = input.name;
            product.description = input.description;
            product.brand_id = input.brand_id;
            product.price = input.price;
            product.is_new = input.is_new;
            product.updated_at = Utc::now();
            Ok(1)
        })
        .await
    }

    async fn delete_product(&self, ctx: &OpContext, id: ProductId) -> StoreResult<u64> {
        ctx.run("delete_product", async {
            let mut tables = self.enter("delete_product").await?;
            if tables.cart.values().any(|line| line.product_id == id) {
                return Err(StoreError::Constraint {
                    op: "delete_product",
                    message: format!("product {id} is referenced by the cart"),
                });
            }
            Ok(u64::from(tables.products.remove(&id).is_some()))
        })
        .await
    }

    async fn about_page_by_brand(&self, ctx: &OpContext, brand_id: i32) -> StoreResult<AboutPage> {
        ctx.run("about_page_by_brand", async {
            let tables = self.enter("about_page_by_brand").await?;
            tables
                .about_pages
                .iter()
                .filter(|page| page.brand_id == brand_id)
                .min_by_key(|page| page.id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("about page for brand", brand_id))
        })
        .await
    }

    async fn list_branches(&self, ctx: &OpContext) -> StoreResult<Vec<Branch>> {
        ctx.run("list_branches", self.filter_branches("list_branches", |_| true))
            .await
    }

    async fn branches_by_brand(&self, ctx: &OpContext, brand_id: i32) -> StoreResult<Vec<Branch>> {
        ctx.run(
            "branches_by_brand",
            self.filter_branches("branches_by_brand", |b| b.brand_id == brand_id),
        )
        .await
    }

    async fn branches_by_brand_and_province(
        &self,
        ctx: &OpContext,
        brand_id: i32,
        province: &str,
    ) -> StoreResult<Vec<Branch>> {
        ctx.run(
            "branches_by_brand_and_province",
            self.filter_branches("branches_by_brand_and_province", |b| {
                b.brand_id == brand_id && b.province == province
            }),
        )
        .await
    }

    async fn get_brand(&self, ctx: &OpContext, id: &BrandId) -> StoreResult<Brand> {
        ctx.run("get_brand", async {
            let tables = self.enter("get_brand").await?;
            tables
                .brand_key(id)
                .and_then(|key| tables.brands.get(&key))
                .cloned()
                .ok_or_else(|| StoreError::not_found("brand", id))
        })
        .await
    }

    async fn list_brands(&self, ctx: &OpContext) -> StoreResult<Vec<Brand>> {
        ctx.run("list_brands", async {
            let tables = self.enter("list_brands").await?;
            Ok(tables.brands.values().cloned().collect())
        })
        .await
    }

    async fn add_brand(&self, ctx: &OpContext, input: BrandInput) -> StoreResult<BrandInput> {
        ctx.run("add_brand", async {
            let mut tables = self.enter("add_brand").await?;
            tables.next_brand_id += 1;
            let key = tables.next_brand_id;
            let id = BrandId::parse(&key.to_string())?;
            tables.brands.insert(
                key,
                Brand {
                    id,
                    name: input.name.clone(),
                    logo: input.logo.clone(),
                },
            );
            Ok(input)
        })
        .await
    }

    async fn update_brand(
        &self,
        ctx: &OpContext,
        id: &BrandId,
        input: BrandInput,
    ) -> StoreResult<u64> {
        ctx.run("update_brand", async {
            let mut tables = self.enter("update_brand").await?;
            let Some(key) = tables.brand_key(id) else {
                return Ok(0);
            };
            if let Some(brand) = tables.brands.get_mut(&key) {
                brand.name = input.name;
                brand.logo = input.logo;
            }
            Ok(1)
        })
        .await
    }

    async fn delete_brand(&self, ctx: &OpContext, id: &BrandId) -> StoreResult<u64> {
        ctx.run("delete_brand", async {
            let mut tables = self.enter("delete_brand").await?;
            let Some(key) = tables.brand_key(id) else {
                return Ok(0);
            };
            tables.brands.remove(&key);
            Ok(1)
        })
        .await
    }

    async fn list_cart(&self, ctx: &OpContext) -> StoreResult<Vec<CartItem>> {
        ctx.run("list_cart", async {
            let tables = self.enter("list_cart").await?;
            let items = tables
                .cart
                .values()
                .filter_map(|line| {
                    let product = tables.products.get(&line.product_id)?;
                    Some(CartItem {
                        cart_id: line.cart_id,
                        product_id: line.product_id,
                        product_name: product.name.clone(),
                        product_image: product.image.clone(),
                        quantity: line.quantity,
                        price: product.price.line_total(line.quantity),
                        created_at: line.created_at,
                        updated_at: line.updated_at,
                    })
                })
                .collect();
            Ok(items)
        })
        .await
    }

    async fn add_to_cart(
        &self,
        ctx: &OpContext,
        product_id: ProductId,
        quantity: Quantity,
    ) -> StoreResult<CartUpsert> {
        ctx.run("add_to_cart", async {
            let mut tables = self.enter("add_to_cart").await?;
            if !tables.products.contains_key(&product_id) {
                return Err(StoreError::not_found("product", product_id));
            }
            let now = Utc::now();

            if let Some(line) = tables
                .cart
                .values_mut()
                .find(|line| line.product_id == product_id)
            {
                let total = i64::from(line.quantity.get()) + i64::from(quantity.get());
                line.quantity = Quantity::new(total).map_err(|_| StoreError::Database {
                    op: "add_to_cart",
                    message: "integer out of range".to_owned(),
                })?;
                line.updated_at = now;
                return Ok(CartUpsert::Incremented);
            }

            tables.next_cart_id += 1;
            let cart_id = CartId::new(tables.next_cart_id);
            tables.cart.insert(
                cart_id,
                CartLine {
                    cart_id,
                    product_id,
                    quantity,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(CartUpsert::Inserted)
        })
        .await
    }

    async fn remove_from_cart(&self, ctx: &OpContext, cart_id: CartId) -> StoreResult<u64> {
        ctx.run("remove_from_cart", async {
            let mut tables = self.enter("remove_from_cart").await?;
            Ok(u64::from(tables.cart.remove(&cart_id).is_some()))
        })
        .await
    }
}
