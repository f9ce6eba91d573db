//! Brands, categories and colors (read side).
//!
//! The admin server owns the writes; both servers list them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;
use crate::{BrandId, CategoryId, ColorId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Color {
    pub id: ColorId,
    pub name: String,
    pub hex: String,
}

/// Read access to the catalog taxonomy.
pub struct TaxonomyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaxonomyRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All brands by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        Ok(sqlx::query_as::<_, Brand>(
            "SELECT id, name, slug, created_at FROM shop.brand ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?)
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at FROM shop.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?)
    }

    /// All colors by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn colors(&self) -> Result<Vec<Color>, RepositoryError> {
        Ok(
            sqlx::query_as::<_, Color>("SELECT id, name, hex FROM shop.color ORDER BY name, id")
                .fetch_all(self.pool)
                .await?,
        )
    }

    /// Colors attached to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn colors_for_product(
        &self,
        product_id: crate::ProductId,
    ) -> Result<Vec<Color>, RepositoryError> {
        Ok(sqlx::query_as::<_, Color>(
            r"
            SELECT c.id, c.name, c.hex
            FROM shop.color c
            JOIN shop.product_color pc ON pc.color_id = c.id
            WHERE pc.product_id = $1
            ORDER BY c.name, c.id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?)
    }
}
