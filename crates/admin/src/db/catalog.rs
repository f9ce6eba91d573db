//! Product writes.
//!
//! A product's size list is stored twice: as ordered `shop.product_size`
//! records and as the legacy `sizes_csv` column. Both are rewritten together
//! whenever sizes are given, so the size-stock resolver sees the same list
//! whichever one it reads.

use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use tidewear_core::db::ProductRepository;
use tidewear_core::db::products::Product;
use tidewear_core::{BrandId, CategoryId, ColorId, Price, ProductId, ProductRef, Slug};

use super::{RepositoryError, constraint_error};

const MISSING_REFERENCE: &str = "brand, category or color does not exist";

/// Everything an admin can set on a product.
///
/// The scalar fields are always written. `sizes`, `color_ids`, `attributes`
/// and `is_active` are left untouched on update when `None`; on create they
/// default to no sizes, no colors, `{}` and active.
#[derive(Debug, Clone)]
pub struct ProductWrite {
    pub title: String,
    pub slug: Slug,
    pub description: String,
    pub sku: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub sizes: Option<Vec<String>>,
    pub color_ids: Option<Vec<ColorId>>,
    /// Stored verbatim; must be a JSON object.
    pub attributes: Option<Value>,
    pub is_active: Option<bool>,
}

/// Repository for product writes.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product with its sizes and colors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a taken slug, an unknown
    /// brand/category/color, or a stock count that does not fit.
    pub async fn create(&self, product: &ProductWrite) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.product
                (title, slug, description, sku, price, stock,
                 brand_id, category_id, attributes, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    COALESCE($9, '{}'::jsonb), COALESCE($10, TRUE))
            RETURNING id
            ",
        )
        .bind(&product.title)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.sku.as_deref())
        .bind(product.price)
        .bind(stock_column(product.stock)?)
        .bind(product.brand_id)
        .bind(product.category_id)
        .bind(product.attributes.as_ref())
        .bind(product.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| constraint_error(e, MISSING_REFERENCE))?;

        write_relations(&mut tx, id, product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, slug = %product.slug, "Product created");
        self.reload(id).await
    }

    /// Overwrite a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product, and the
    /// same conflicts as [`Self::create`].
    pub async fn update(
        &self,
        id: ProductId,
        product: &ProductWrite,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<ProductId> = sqlx::query_scalar(
            r"
            UPDATE shop.product
            SET title = $2, slug = $3, description = $4, sku = $5, price = $6,
                stock = $7, brand_id = $8, category_id = $9,
                attributes = COALESCE($10, attributes),
                is_active = COALESCE($11, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id)
        .bind(&product.title)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.sku.as_deref())
        .bind(product.price)
        .bind(stock_column(product.stock)?)
        .bind(product.brand_id)
        .bind(product.category_id)
        .bind(product.attributes.as_ref())
        .bind(product.is_active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| constraint_error(e, MISSING_REFERENCE))?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound);
        }

        write_relations(&mut tx, id, product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "Product updated");
        self.reload(id).await
    }

    /// Delete a product. Carts, wishlists, sizes, colors and media records
    /// go with it; past order items keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn reload(&self, id: ProductId) -> Result<Product, RepositoryError> {
        ProductRepository::new(self.pool)
            .find(&ProductRef::Id(id), true)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

async fn write_relations(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    product: &ProductWrite,
) -> Result<(), RepositoryError> {
    if let Some(sizes) = &product.sizes {
        replace_sizes(tx, id, sizes).await?;
    }
    if let Some(color_ids) = &product.color_ids {
        replace_colors(tx, id, color_ids).await?;
    }
    Ok(())
}

async fn replace_sizes(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    sizes: &[String],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.product_size WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r"
        INSERT INTO shop.product_size (product_id, label, position)
        SELECT $1, label, (position - 1)::int
        FROM UNNEST($2::text[]) WITH ORDINALITY AS s(label, position)
        ",
    )
    .bind(id)
    .bind(sizes)
    .execute(&mut **tx)
    .await?;

    sqlx::query("UPDATE shop.product SET sizes_csv = $2 WHERE id = $1")
        .bind(id)
        .bind(sizes_csv(sizes))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn replace_colors(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    color_ids: &[ColorId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.product_color WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    let raw: Vec<i32> = color_ids.iter().map(ColorId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO shop.product_color (product_id, color_id)
        SELECT $1, color_id FROM UNNEST($2::int4[]) AS c(color_id)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(id)
    .bind(&raw)
    .execute(&mut **tx)
    .await
    .map_err(|e| constraint_error(e, MISSING_REFERENCE))?;
    Ok(())
}

fn stock_column(stock: u32) -> Result<i32, RepositoryError> {
    i32::try_from(stock).map_err(|_| RepositoryError::Conflict("stock is out of range".to_owned()))
}

/// The legacy CSV form of a size list; `None` when there are no sizes.
#[must_use]
pub fn sizes_csv(sizes: &[String]) -> Option<String> {
    (!sizes.is_empty()).then(|| sizes.join(","))
}

/// Trim labels, drop blanks and repeats, keep order.
///
/// # Errors
///
/// Returns the offending label when it contains a comma, which the CSV
/// column could not represent.
pub fn normalize_sizes(raw: &[String]) -> Result<Vec<String>, String> {
    let mut sizes: Vec<String> = Vec::with_capacity(raw.len());
    for label in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if label.contains(',') {
            return Err(label.to_owned());
        }
        if !sizes.iter().any(|existing| existing == label) {
            sizes.push(label.to_owned());
        }
    }
    Ok(sizes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_normalize_sizes() {
        assert_eq!(
            normalize_sizes(&labels(&[" S", "M ", "", "S", "XL"])).unwrap(),
            labels(&["S", "M", "XL"])
        );
        assert_eq!(normalize_sizes(&labels(&["S,M"])).unwrap_err(), "S,M");
        assert!(normalize_sizes(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sizes_csv() {
        assert_eq!(sizes_csv(&labels(&["S", "M"])).as_deref(), Some("S,M"));
        assert_eq!(sizes_csv(&[]), None);
    }

    #[test]
    fn test_stock_column() {
        assert_eq!(stock_column(12).unwrap(), 12);
        assert!(matches!(
            stock_column(u32::MAX),
            Err(RepositoryError::Conflict(_))
        ));
    }
}
