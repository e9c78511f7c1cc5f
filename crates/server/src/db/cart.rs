//! Cart repository.
//!
//! The cart holds at most one line per product. Adding a product that is
//! already in the cart increments that line instead of creating a second
//! one; concurrent adds for the same product are serialised with a
//! transaction-scoped advisory lock keyed on the product ID.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use clothes_catalog_core::{
    CartId, CartItem, CartUpsert, Price, ProductId, Quantity, StoreError, StoreResult,
};

use super::classify;

/// First key of the two-key advisory lock taken by [`CartRepository::upsert`].
const CART_LOCK_NAMESPACE: i32 = 0x6361_7274; // "cart"

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    cart_id: CartId,
    product_id: ProductId,
    name: String,
    imgsrc: String,
    quantity: i32,
    line_total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartLineRow {
    fn into_item(self) -> StoreResult<CartItem> {
        let quantity = Quantity::new(i64::from(self.quantity)).map_err(|e| StoreError::Decode {
            op: "list_cart",
            message: format!("cart line {}: {e}", self.cart_id),
        })?;

        Ok(CartItem {
            cart_id: self.cart_id,
            product_id: self.product_id,
            product_name: self.name,
            product_image: self.imgsrc,
            quantity,
            price: Price::new(self.line_total),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every cart line, joined with its product and priced at the product's
    /// current price times the line quantity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decode` if a stored quantity is not positive.
    pub async fn list(&self) -> StoreResult<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.cart_id, c.product_id, p.name, p.imgsrc, c.quantity,
                   p.price * c.quantity AS line_total,
                   c.created_at, c.updated_at
            FROM cart c
            JOIN products p ON p.id = c.product_id
            ORDER BY c.cart_id
            ",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("list_cart", e))?;

        rows.into_iter().map(CartLineRow::into_item).collect()
    }

    /// Insert a cart line for `product_id` or add `quantity` to the existing one.
    ///
    /// A new line snapshots the product's current price. Every statement runs
    /// in one transaction; if the future is dropped before commit the
    /// transaction is rolled back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product does not exist.
    /// Returns `StoreError::Constraint` if a concurrent writer outside this
    /// lock protocol inserted a line for the same product.
    /// Returns `StoreError::Transaction` if the commit fails.
    pub async fn upsert(&self, product_id: ProductId, quantity: Quantity) -> StoreResult<CartUpsert> {
        const OP: &str = "add_to_cart";

        let mut tx = self.pool.begin().await.map_err(|e| classify(OP, e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(CART_LOCK_NAMESPACE)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(OP, e))?;

        let price: Option<Decimal> = sqlx::query_scalar("SELECT price FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify(OP, e))?;
        let Some(price) = price else {
            return Err(StoreError::not_found("product", product_id));
        };

        let existing: Option<CartId> =
            sqlx::query_scalar("SELECT cart_id FROM cart WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| classify(OP, e))?;

        let outcome = match existing {
            Some(cart_id) => {
                sqlx::query(
                    r"
                    UPDATE cart
                    SET quantity = quantity + $1, updated_at = NOW()
                    WHERE cart_id = $2
                    ",
                )
                .bind(quantity.get())
                .bind(cart_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(OP, e))?;
                CartUpsert::Incremented
            }
            None => {
                sqlx::query(
                    r"
                    INSERT INTO cart (product_id, quantity, price, created_at, updated_at)
                    VALUES ($1, $2, $3, NOW(), NOW())
                    ",
                )
                .bind(product_id)
                .bind(quantity.get())
                .bind(price)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(OP, e))?;
                CartUpsert::Inserted
            }
        };

        tx.commit().await.map_err(|e| StoreError::Transaction {
            op: OP,
            message: e.to_string(),
        })?;

        tracing::debug!(%product_id, quantity = quantity.get(), ?outcome, "cart upserted");
        Ok(outcome)
    }

    /// Delete a cart line.
    ///
    /// Returns the number of rows affected (zero if the line does not exist).
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the statement fails.
    pub async fn delete(&self, cart_id: CartId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cart WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("remove_from_cart", e))?;

        Ok(result.rows_affected())
    }
}
