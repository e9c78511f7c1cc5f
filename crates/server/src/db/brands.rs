//! Brand repository.
//!
//! Brand IDs are string identifiers at the API surface, so the `id` column
//! is selected and compared as text.

use sqlx::PgPool;

use clothes_catalog_core::{Brand, BrandId, BrandInput, StoreError, StoreResult};

use super::classify;

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: String,
    brandname: String,
    brandlogo: String,
}

impl BrandRow {
    fn into_brand(self, op: &'static str) -> StoreResult<Brand> {
        let id = BrandId::parse(&self.id).map_err(|e| StoreError::Decode {
            op,
            message: format!("invalid brand id in database: {e}"),
        })?;

        Ok(Brand {
            id,
            name: self.brandname,
            logo: self.brandlogo,
        })
    }
}

/// Repository for brand database operations.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a brand by its ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no brand has this ID.
    /// Returns `StoreError::Decode` if the stored ID is empty.
    pub async fn get(&self, id: &BrandId) -> StoreResult<Brand> {
        let row = sqlx::query_as::<_, BrandRow>(
            "SELECT id::text AS id, brandname, brandlogo FROM brand WHERE id::text = $1",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("get_brand", e))?;

        match row {
            Some(r) => r.into_brand("get_brand"),
            None => Err(StoreError::not_found("brand", id)),
        }
    }

    /// All brands.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn list(&self) -> StoreResult<Vec<Brand>> {
        let rows = sqlx::query_as::<_, BrandRow>(
            "SELECT id::text AS id, brandname, brandlogo FROM brand ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("list_brands", e))?;

        rows.into_iter()
            .map(|r| r.into_brand("list_brands"))
            .collect()
    }

    /// Insert a brand.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if the row violates a table constraint.
    pub async fn create(&self, input: &BrandInput) -> StoreResult<()> {
        sqlx::query("INSERT INTO brand (brandname, brandlogo) VALUES ($1, $2)")
            .bind(&input.name)
            .bind(&input.logo)
            .execute(self.pool)
            .await
            .map_err(|e| classify("add_brand", e))?;

        Ok(())
    }

    /// Overwrite a brand's name and logo.
    ///
    /// Returns the number of rows affected (zero if the ID does not exist).
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the statement fails.
    pub async fn update(&self, id: &BrandId, input: &BrandInput) -> StoreResult<u64> {
        let result =
            sqlx::query("UPDATE brand SET brandname = $1, brandlogo = $2 WHERE id::text = $3")
                .bind(&input.name)
                .bind(&input.logo)
                .bind(id.as_str())
                .execute(self.pool)
                .await
                .map_err(|e| classify("update_brand", e))?;

        Ok(result.rows_affected())
    }

    /// Delete a brand.
    ///
    /// Returns the number of rows affected (zero if the ID does not exist).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if products or branches still
    /// reference the brand.
    pub async fn delete(&self, id: &BrandId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM brand WHERE id::text = $1")
            .bind(id.as_str())
            .execute(self.pool)
            .await
            .map_err(|e| classify("delete_brand", e))?;

        Ok(result.rows_affected())
    }
}
