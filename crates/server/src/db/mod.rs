//! `PostgreSQL`-backed catalog store.
//!
//! # Tables
//!
//! - `products` - Catalog products (`brand` references `brand.id`)
//! - `brand` - Brands
//! - `about_page` - One "about" page per brand
//! - `branch` - Physical branches per brand and province
//! - `cart` - Cart lines, at most one per product
//!
//! The schema is managed outside this service; see
//! `crates/integration-tests/fixtures/schema.sql` for the shape these
//! queries assume.

mod about;
mod branches;
mod brands;
mod cart;
pub mod memory;
mod products;

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use clothes_catalog_core::{
    AboutPage, Branch, Brand, BrandId, BrandInput, CartId, CartItem, CartUpsert, CatalogStore,
    ConnectionLifecycle, OpContext, Product, ProductId, ProductInput, Quantity, StoreError,
    StoreResult,
};

pub use about::AboutPageRepository;
pub use branches::BranchRepository;
pub use brands::BrandRepository;
pub use cart::CartRepository;
pub use memory::MemoryStore;
pub use products::ProductRepository;

/// Connection pool parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// Idle connections above `min_connections` are closed after this long.
    pub idle_timeout: Duration,
    /// Connections are recycled after this long regardless of use.
    pub max_lifetime: Duration,
    /// How long an operation waits for a free connection.
    pub acquire_timeout: Duration,
    /// Bound on a single liveness probe.
    pub probe_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 0,
            idle_timeout: Duration::from_secs(10 * 60),
            max_lifetime: Duration::from_secs(5 * 60),
            acquire_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Catalog store over a swappable `PostgreSQL` pool.
///
/// Every operation clones the active pool handle under a read lock, so a
/// concurrent [`reconnect`](ConnectionLifecycle::reconnect) never leaves an
/// operation holding a half-replaced handle.
#[derive(Debug)]
pub struct PgStore {
    pool: RwLock<PgPool>,
    settings: PoolSettings,
}

impl PgStore {
    /// Build a pool for `database_url` and verify it with a bounded probe.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the URL is malformed or the probe
    /// fails within `settings.probe_timeout`.
    pub async fn open(database_url: &SecretString, settings: PoolSettings) -> StoreResult<Self> {
        let pool = create_pool(database_url, settings, "open").await?;
        Ok(Self {
            pool: RwLock::new(pool),
            settings,
        })
    }

    /// Wrap an existing pool without probing it.
    #[must_use]
    pub fn from_pool(pool: PgPool, settings: PoolSettings) -> Self {
        Self {
            pool: RwLock::new(pool),
            settings,
        }
    }

    /// The active pool handle.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The settings new pools are built with.
    #[must_use]
    pub const fn settings(&self) -> &PoolSettings {
        &self.settings
    }
}

/// Create a `PostgreSQL` connection pool and probe it.
///
/// `op` names the caller (`"open"` or `"reconnect"`) in any error.
///
/// # Errors
///
/// Returns `StoreError::Connection` if the pool cannot be built or the
/// probe does not succeed in time. A pool that fails its probe is closed.
pub async fn create_pool(
    database_url: &SecretString,
    settings: PoolSettings,
    op: &'static str,
) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .idle_timeout(Some(settings.idle_timeout))
        .max_lifetime(Some(settings.max_lifetime))
        .acquire_timeout(settings.acquire_timeout)
        .connect_lazy(database_url.expose_secret())
        .map_err(|e| StoreError::Connection {
            op,
            message: e.to_string(),
        })?;

    if let Err(e) = probe(&pool, settings.probe_timeout, op).await {
        pool.close().await;
        return Err(match e {
            StoreError::Timeout { op } => StoreError::Connection {
                op,
                message: "liveness probe timed out".to_owned(),
            },
            other => other,
        });
    }

    Ok(pool)
}

/// Run `SELECT 1` against `pool`, bounded by `timeout`.
async fn probe(pool: &PgPool, timeout: Duration, op: &'static str) -> StoreResult<()> {
    match tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(StoreError::Connection {
            op,
            message: e.to_string(),
        }),
        Err(_) => Err(StoreError::Timeout { op }),
    }
}

/// Classify a `sqlx` error raised while running `op`.
pub(crate) fn classify(op: &'static str, err: sqlx::Error) -> StoreError {
    let message = err.to_string();
    match err {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Decode { op, message },
        sqlx::Error::Database(ref db_err) => match db_err.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StoreError::Constraint { op, message },
            _ => StoreError::Database { op, message },
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => StoreError::Connection { op, message },
        _ => StoreError::Database { op, message },
    }
}

/// Escape `LIKE` metacharacters and wrap the needle for a substring match.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl ConnectionLifecycle for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        probe(&self.pool(), self.settings.probe_timeout, "ping").await
    }

    #[instrument(skip_all)]
    async fn reconnect(&self, connection_string: &SecretString) -> StoreResult<()> {
        let fresh = create_pool(connection_string, self.settings, "reconnect").await?;

        let old = {
            let mut active = self.pool.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, fresh)
        };

        // In-flight operations keep their own handle; close waits for them.
        tokio::spawn(async move { old.close().await });
        tracing::info!("database pool replaced");
        Ok(())
    }

    async fn close(&self) {
        self.pool().close().await;
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    #[instrument(skip(self, ctx))]
    async fn get_product(&self, ctx: &OpContext, id: ProductId) -> StoreResult<Product> {
        let pool = self.pool();
        ctx.run("get_product", ProductRepository::new(&pool).get(id))
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn list_products(&self, ctx: &OpContext) -> StoreResult<Vec<Product>> {
        let pool = self.pool();
        ctx.run("list_products", ProductRepository::new(&pool).list())
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn products_by_category(
        &self,
        ctx: &OpContext,
        category: &str,
    ) -> StoreResult<Vec<Product>> {
        let pool = self.pool();
        ctx.run(
            "products_by_category",
            ProductRepository::new(&pool).by_category(category),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn products_by_brand(
        &self,
        ctx: &OpContext,
        brand_id: i32,
    ) -> StoreResult<Vec<Product>> {
        let pool = self.pool();
        ctx.run(
            "products_by_brand",
            ProductRepository::new(&pool).by_brand(brand_id),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn search_products(&self, ctx: &OpContext, query: &str) -> StoreResult<Vec<Product>> {
        let pool = self.pool();
        ctx.run("search_products", ProductRepository::new(&pool).search(query))
            .await
    }

    #[instrument(skip(self, ctx, input), fields(name = %input.name))]
    async fn add_product(
        &self,
        ctx: &OpContext,
        input: ProductInput,
    ) -> StoreResult<ProductInput> {
        let pool = self.pool();
        ctx.run("add_product", async {
            ProductRepository::new(&pool).create(&input).await?;
            Ok(input)
        })
        .await
    }

    #[instrument(skip(self, ctx, input))]
    async fn update_product(
        &self,
        ctx: &OpContext,
        id: ProductId,
        input: ProductInput,
    ) -> StoreResult<u64> {
        let pool = self.pool();
        ctx.run(
            "update_product",
            ProductRepository::new(&pool).update(id, &input),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn delete_product(&self, ctx: &OpContext, id: ProductId) -> StoreResult<u64> {
        let pool = self.pool();
        ctx.run("delete_product", ProductRepository::new(&pool).delete(id))
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn about_page_by_brand(&self, ctx: &OpContext, brand_id: i32) -> StoreResult<AboutPage> {
        let pool = self.pool();
        ctx.run(
            "about_page_by_brand",
            AboutPageRepository::new(&pool).by_brand(brand_id),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn list_branches(&self, ctx: &OpContext) -> StoreResult<Vec<Branch>> {
        let pool = self.pool();
        ctx.run("list_branches", BranchRepository::new(&pool).list())
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn branches_by_brand(&self, ctx: &OpContext, brand_id: i32) -> StoreResult<Vec<Branch>> {
        let pool = self.pool();
        ctx.run(
            "branches_by_brand",
            BranchRepository::new(&pool).by_brand(brand_id),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn branches_by_brand_and_province(
        &self,
        ctx: &OpContext,
        brand_id: i32,
        province: &str,
    ) -> StoreResult<Vec<Branch>> {
        let pool = self.pool();
        ctx.run(
            "branches_by_brand_and_province",
            BranchRepository::new(&pool).by_brand_and_province(brand_id, province),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(brand_id = %id))]
    async fn get_brand(&self, ctx: &OpContext, id: &BrandId) -> StoreResult<Brand> {
        let pool = self.pool();
        ctx.run("get_brand", BrandRepository::new(&pool).get(id))
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn list_brands(&self, ctx: &OpContext) -> StoreResult<Vec<Brand>> {
        let pool = self.pool();
        ctx.run("list_brands", BrandRepository::new(&pool).list())
            .await
    }

    #[instrument(skip(self, ctx, input), fields(name = %input.name))]
    async fn add_brand(&self, ctx: &OpContext, input: BrandInput) -> StoreResult<BrandInput> {
        let pool = self.pool();
        ctx.run("add_brand", async {
            BrandRepository::new(&pool).create(&input).await?;
            Ok(input)
        })
        .await
    }

    #[instrument(skip(self, ctx, input), fields(brand_id = %id))]
    async fn update_brand(
        &self,
        ctx: &OpContext,
        id: &BrandId,
        input: BrandInput,
    ) -> StoreResult<u64> {
        let pool = self.pool();
        ctx.run("update_brand", BrandRepository::new(&pool).update(id, &input))
            .await
    }

    #[instrument(skip(self, ctx), fields(brand_id = %id))]
    async fn delete_brand(&self, ctx: &OpContext, id: &BrandId) -> StoreResult<u64> {
        let pool = self.pool();
        ctx.run("delete_brand", BrandRepository::new(&pool).delete(id))
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn list_cart(&self, ctx: &OpContext) -> StoreResult<Vec<CartItem>> {
        let pool = self.pool();
        ctx.run("list_cart", CartRepository::new(&pool).list())
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn add_to_cart(
        &self,
        ctx: &OpContext,
        product_id: ProductId,
        quantity: Quantity,
    ) -> StoreResult<CartUpsert> {
        let pool = self.pool();
        ctx.run(
            "add_to_cart",
            CartRepository::new(&pool).upsert(product_id, quantity),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn remove_from_cart(&self, ctx: &OpContext, cart_id: CartId) -> StoreResult<u64> {
        let pool = self.pool();
        ctx.run("remove_from_cart", CartRepository::new(&pool).delete(cart_id))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("shirt"), "%shirt%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_classify_connection_errors() {
        assert!(matches!(
            classify("list_products", sqlx::Error::PoolTimedOut),
            StoreError::Connection { op: "list_products", .. }
        ));
        assert!(matches!(
            classify("list_products", sqlx::Error::PoolClosed),
            StoreError::Connection { .. }
        ));
    }

    #[test]
    fn test_classify_decode_errors() {
        let err = classify("get_brand", sqlx::Error::ColumnNotFound("brandname".to_owned()));
        assert!(matches!(err, StoreError::Decode { op: "get_brand", .. }));
    }

    #[test]
    fn test_classify_falls_back_to_database() {
        let err = classify("get_product", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database { op: "get_product", .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_default_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 25);
        assert_eq!(settings.max_lifetime, Duration::from_secs(300));
        assert_eq!(settings.probe_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_open_rejects_malformed_url() {
        let url = SecretString::from("not a url".to_owned());
        let err = PgStore::open(&url, PoolSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection { op: "open", .. }));
    }

    #[tokio::test]
    async fn test_open_against_silent_server_is_a_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let url = SecretString::from(format!("postgres://catalog:pw@127.0.0.1:{port}/catalog"));
        let settings = PoolSettings {
            probe_timeout: Duration::from_millis(300),
            ..PoolSettings::default()
        };
        let err = PgStore::open(&url, settings).await.unwrap_err();
        accept.abort();

        match err {
            StoreError::Connection { op, message } => {
                assert_eq!(op, "open");
                assert_eq!(message, "liveness probe timed out");
            }
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reconnect_failure_names_reconnect() {
        let store = PgStore::from_pool(
            PgPoolOptions::new()
                .connect_lazy("postgres://catalog@127.0.0.1:1/catalog")
                .unwrap(),
            PoolSettings::default(),
        );
        let url = SecretString::from("not a url".to_owned());
        let err = store.reconnect(&url).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection { op: "reconnect", .. }));
    }
}
