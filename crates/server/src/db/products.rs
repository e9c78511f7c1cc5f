//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use clothes_catalog_core::{Price, Product, ProductId, ProductInput, StoreError, StoreResult};

use super::{classify, like_pattern};

const PRODUCT_COLUMNS: &str =
    "id, category, imgsrc, name, description, brand, price, isnew, createdate, updatedate";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    category: String,
    imgsrc: String,
    name: String,
    description: String,
    brand: i32,
    price: Decimal,
    isnew: bool,
    createdate: DateTime<Utc>,
    updatedate: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            category: r.category,
            image: r.imgsrc,
            name: r.name,
            description: r.description,
            brand_id: r.brand,
            price: Price::new(r.price),
            is_new: r.isnew,
            created_at: r.createdate,
            updated_at: r.updatedate,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no product has this ID.
    pub async fn get(&self, id: ProductId) -> StoreResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("get_product", e))?
            .map(Product::from)
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        self.fetch_all("list_products", &sql, None).await
    }

    /// Products with exactly this category.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn by_category(&self, category: &str) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY id");
        self.fetch_all("products_by_category", &sql, Some(category))
            .await
    }

    /// Products belonging to a brand.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn by_brand(&self, brand_id: i32) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE brand = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(brand_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("products_by_brand", e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// `LIKE` metacharacters in `query` match literally.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn search(&self, query: &str) -> StoreResult<Vec<Product>> {
        let sql = format!(
            r"SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\'
            ORDER BY id"
        );
        let pattern = like_pattern(query);
        self.fetch_all("search_products", &sql, Some(&pattern)).await
    }

    /// Insert a product. `createdate` and `updatedate` are set by storage.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if the row violates a table constraint.
    pub async fn create(&self, input: &ProductInput) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO products (category, imgsrc, name, description, brand, price, isnew, createdate, updatedate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ",
        )
        .bind(&input.category)
        .bind(&input.image)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.brand_id)
        .bind(input.price.amount())
        .bind(input.is_new)
        .execute(self.pool)
        .await
        .map_err(|e| classify("add_product", e))?;

        Ok(())
    }

    /// Overwrite every writable field of a product and touch `updatedate`.
    ///
    /// Returns the number of rows affected (zero if the ID does not exist).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if the new values violate a constraint.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> StoreResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET category = $1, imgsrc = $2, name = $3, description = $4,
                brand = $5, price = $6, isnew = $7, updatedate = NOW()
            WHERE id = $8
            ",
        )
        .bind(&input.category)
        .bind(&input.image)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.brand_id)
        .bind(input.price.amount())
        .bind(input.is_new)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| classify("update_product", e))?;

        Ok(result.rows_affected())
    }

    /// Delete a product.
    ///
    /// Returns the number of rows affected (zero if the ID does not exist).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if a cart line still references it.
    pub async fn delete(&self, id: ProductId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("delete_product", e))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(
        &self,
        op: &'static str,
        sql: &str,
        arg: Option<&str>,
    ) -> StoreResult<Vec<Product>> {
        let mut query = sqlx::query_as::<_, ProductRow>(sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        let rows = query
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify(op, e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
