//! Brand, category and color writes.

use sqlx::PgPool;
use sqlx::postgres::PgRow;

use tidewear_core::db::taxonomy::{Brand, Category, Color};
use tidewear_core::{BrandId, CategoryId, ColorId, Slug};

use super::RepositoryError;

/// Brand and category share a shape; only the table differs.
#[derive(Debug, Clone, Copy)]
enum NamedTable {
    Brand,
    Category,
}

impl NamedTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Brand => "shop.brand",
            Self::Category => "shop.category",
        }
    }
}

/// Repository for taxonomy writes.
pub struct TaxonomyWriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaxonomyWriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_brand(&self, name: &str, slug: &Slug) -> Result<Brand, RepositoryError> {
        self.insert_named(NamedTable::Brand, name, slug).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown brand and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_brand(
        &self,
        id: BrandId,
        name: &str,
        slug: &Slug,
    ) -> Result<Brand, RepositoryError> {
        self.update_named(NamedTable::Brand, id.as_i32(), name, slug)
            .await
    }

    /// Delete a brand; its products keep existing without one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown brand.
    pub async fn delete_brand(&self, id: BrandId) -> Result<(), RepositoryError> {
        self.delete_from(NamedTable::Brand.name(), id.as_i32()).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_category(
        &self,
        name: &str,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        self.insert_named(NamedTable::Category, name, slug).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown category and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        self.update_named(NamedTable::Category, id.as_i32(), name, slug)
            .await
    }

    /// Delete a category; its products keep existing without one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown category.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        self.delete_from(NamedTable::Category.name(), id.as_i32())
            .await
    }

    /// `hex` must already be a normalized `#RRGGBB` string.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_color(&self, name: &str, hex: &str) -> Result<Color, RepositoryError> {
        Ok(sqlx::query_as::<_, Color>(
            "INSERT INTO shop.color (name, hex) VALUES ($1, $2) RETURNING id, name, hex",
        )
        .bind(name)
        .bind(hex)
        .fetch_one(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown color.
    pub async fn update_color(
        &self,
        id: ColorId,
        name: &str,
        hex: &str,
    ) -> Result<Color, RepositoryError> {
        sqlx::query_as::<_, Color>(
            "UPDATE shop.color SET name = $2, hex = $3 WHERE id = $1 RETURNING id, name, hex",
        )
        .bind(id)
        .bind(name)
        .bind(hex)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a color and detach it from every product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown color.
    pub async fn delete_color(&self, id: ColorId) -> Result<(), RepositoryError> {
        self.delete_from("shop.color", id.as_i32()).await
    }

    async fn insert_named<T>(
        &self,
        table: NamedTable,
        name: &str,
        slug: &Slug,
    ) -> Result<T, RepositoryError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug, created_at",
            table.name()
        ))
        .bind(name)
        .bind(slug.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "slug is already taken"))
    }

    async fn update_named<T>(
        &self,
        table: NamedTable,
        id: i32,
        name: &str,
        slug: &Slug,
    ) -> Result<T, RepositoryError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            "UPDATE {} SET name = $2, slug = $3 WHERE id = $1 RETURNING id, name, slug, created_at",
            table.name()
        ))
        .bind(id)
        .bind(name)
        .bind(slug.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "slug is already taken"))?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete_from(&self, table: &str, id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Normalize a color to upper-case `#RRGGBB`; `None` for anything else.
#[must_use]
pub fn normalize_hex(input: &str) -> Option<String> {
    let digits = input.trim().strip_prefix('#')?;
    (digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| format!("#{}", digits.to_ascii_uppercase()))
}
