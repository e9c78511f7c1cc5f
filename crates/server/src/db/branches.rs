//! Branch repository. Read-only.

use sqlx::PgPool;

use clothes_catalog_core::{Branch, BranchId, StoreResult};

use super::classify;

#[derive(Debug, sqlx::FromRow)]
struct BranchRow {
    id: BranchId,
    brand_id: i32,
    province: String,
    banch: String,
    banch_location: String,
}

impl From<BranchRow> for Branch {
    fn from(r: BranchRow) -> Self {
        Self {
            id: r.id,
            brand_id: r.brand_id,
            province: r.province,
            name: r.banch,
            location: r.banch_location,
        }
    }
}

/// Repository for branch reads.
pub struct BranchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BranchRepository<'a> {
    /// Create a new branch repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All branches.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn list(&self) -> StoreResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            "SELECT id, brand_id, province, banch, banch_location FROM branch ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("list_branches", e))?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }

    /// Branches of one brand.
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn by_brand(&self, brand_id: i32) -> StoreResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r"
            SELECT id, brand_id, province, banch, banch_location
            FROM branch
            WHERE brand_id = $1
            ORDER BY id
            ",
        )
        .bind(brand_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("branches_by_brand", e))?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }

    /// Branches of one brand in one province (exact match).
    ///
    /// # Errors
    ///
    /// Returns a classified `StoreError` if the query fails.
    pub async fn by_brand_and_province(
        &self,
        brand_id: i32,
        province: &str,
    ) -> StoreResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r"
            SELECT id, brand_id, province, banch, banch_location
            FROM branch
            WHERE brand_id = $1 AND province = $2
            ORDER BY id
            ",
        )
        .bind(brand_id)
        .bind(province)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("branches_by_brand_and_province", e))?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }
}
