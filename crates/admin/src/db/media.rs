//! Product image records.

use sqlx::PgPool;

use tidewear_core::db::products::ProductMedia;
use tidewear_core::{MediaId, ProductId};

use super::RepositoryError;

const MEDIA_COLUMNS: &str = "id, product_id, url, file_name, content_type, position, created_at";

/// Repository for `shop.product_media` writes.
pub struct MediaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MediaRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an image after the product's last one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product was deleted
    /// meanwhile.
    pub async fn insert(
        &self,
        product_id: ProductId,
        url: &str,
        file_name: &str,
        content_type: &str,
    ) -> Result<ProductMedia, RepositoryError> {
        sqlx::query_as::<_, ProductMedia>(&format!(
            r"
            INSERT INTO shop.product_media (product_id, url, file_name, content_type, position)
            SELECT $1, $2, $3, $4,
                   COALESCE((SELECT MAX(position) + 1 FROM shop.product_media
                             WHERE product_id = $1), 0)
            RETURNING {MEDIA_COLUMNS}
            "
        ))
        .bind(product_id)
        .bind(url)
        .bind(file_name)
        .bind(content_type)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })
    }

    /// Delete a record and return it, so the caller can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id.
    pub async fn delete(&self, id: MediaId) -> Result<ProductMedia, RepositoryError> {
        sqlx::query_as::<_, ProductMedia>(&format!(
            "DELETE FROM shop.product_media WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Give each listed image its index as position.
    ///
    /// `ids` must already have been checked to be exactly the product's
    /// images (see [`is_complete_order`]).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an update fails.
    pub async fn reorder(
        &self,
        product_id: ProductId,
        ids: &[MediaId],
    ) -> Result<(), RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(MediaId::as_i32).collect();
        sqlx::query(
            r"
            UPDATE shop.product_media m
            SET position = (o.position - 1)::int
            FROM UNNEST($2::int4[]) WITH ORDINALITY AS o(id, position)
            WHERE m.id = o.id AND m.product_id = $1
            ",
        )
        .bind(product_id)
        .bind(&raw)
        .execute(self.pool)
        .await?;

        tracing::info!(%product_id, count = ids.len(), "Product media reordered");
        Ok(())
    }
}

/// Whether `requested` names every one of `existing` exactly once.
#[must_use]
pub fn is_complete_order(existing: &[MediaId], requested: &[MediaId]) -> bool {
    if existing.len() != requested.len() {
        return false;
    }
    let mut a = existing.to_vec();
    let mut b = requested.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    b.windows(2).all(|pair| pair.first() != pair.get(1)) && a == b
}
