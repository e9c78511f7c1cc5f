//! About page repository. Read-only.

use sqlx::PgPool;

use clothes_catalog_core::{AboutPage, AboutPageId, StoreError, StoreResult};

use super::classify;

#[derive(Debug, sqlx::FromRow)]
struct AboutPageRow {
    id: AboutPageId,
    brand_id: i32,
    img: String,
    title: String,
    description: String,
}

/// Repository for about page reads.
pub struct AboutPageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AboutPageRepository<'a> {
    /// Create a new about page repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The about page of a brand. If several exist, the lowest ID wins.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the brand has no about page.
    pub async fn by_brand(&self, brand_id: i32) -> StoreResult<AboutPage> {
        let row = sqlx::query_as::<_, AboutPageRow>(
            r"
            SELECT id, brand_id, img, title, description
            FROM about_page
            WHERE brand_id = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(brand_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("about_page_by_brand", e))?;

        row.map(|r| AboutPage {
            id: r.id,
            brand_id: r.brand_id,
            image: r.img,
            title: r.title,
            description: r.description,
        })
        .ok_or_else(|| StoreError::not_found("about page for brand", brand_id))
    }
}
