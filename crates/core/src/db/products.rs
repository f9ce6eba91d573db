//! Product repository (read side).
//!
//! Listing, detail assembly and the inputs for the size-stock resolver.
//! Writes live in the admin server.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use super::taxonomy::{Brand, Category, Color, TaxonomyRepository};
use super::users::escape_like;
use super::{RepositoryError, non_negative};
use crate::inventory::{HistoricalItem, SizeStockInput, parse_sizes_csv};
use crate::{BrandId, CategoryId, ColorId, MediaId, Price, ProductId, ProductRef};

/// Attribute key holding an explicit per-size stock map.
pub const SIZE_STOCK_ATTRIBUTE: &str = "sizeStock";

/// A product row.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub sku: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub sizes_csv: Option<String>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub attributes: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    slug: String,
    description: String,
    sku: Option<String>,
    price: Price,
    stock: i32,
    sizes_csv: Option<String>,
    brand_id: Option<BrandId>,
    category_id: Option<CategoryId>,
    attributes: Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            sku: row.sku,
            price: row.price,
            stock: non_negative(row.stock, "stock")?,
            sizes_csv: row.sizes_csv,
            brand_id: row.brand_id,
            category_id: row.category_id,
            attributes: row.attributes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column list matching [`ProductRow`], for `p`-aliased queries.
const PRODUCT_COLUMNS: &str = "p.id, p.title, p.slug, p.description, p.sku, p.price, \
     p.stock, p.sizes_csv, p.brand_id, p.category_id, p.attributes, p.is_active, \
     p.created_at, p.updated_at";

/// An uploaded product image.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductMedia {
    pub id: MediaId,
    pub product_id: ProductId,
    pub url: String,
    pub file_name: String,
    pub content_type: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// A product with everything a product page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub brand: Option<Brand>,
    pub category: Option<Category>,
    pub colors: Vec<Color>,
    /// Size labels in display order (detail records, else the CSV list).
    pub sizes: Vec<String>,
    pub media: Vec<ProductMedia>,
}

/// One entry of a product listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub price: Price,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::Title => "p.title ASC, p.id ASC",
        }
    }
}

/// Listing filters. Every `None` means "don't filter".
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive match on title, description or SKU.
    pub query: Option<String>,
    /// Brand slug.
    pub brand: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub color: Option<ColorId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
    /// Include inactive products (admin listings).
    pub include_inactive: bool,
}

const LISTING_WHERE: &str = r"
    WHERE ($1 OR p.is_active)
      AND ($2::text IS NULL OR p.title ILIKE $2 OR p.description ILIKE $2 OR p.sku ILIKE $2)
      AND ($3::text IS NULL OR b.slug = $3)
      AND ($4::text IS NULL OR c.slug = $4)
      AND ($5::int IS NULL OR EXISTS (
            SELECT 1 FROM shop.product_color pc
            WHERE pc.product_id = p.id AND pc.color_id = $5))
      AND ($6::numeric IS NULL OR p.price >= $6)
      AND ($7::numeric IS NULL OR p.price <= $7)
";

/// Repository for product reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ProductSummary>, i64), RepositoryError> {
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let sql = format!(
            r"
            SELECT p.id, p.title, p.slug, p.price, p.is_active, p.created_at,
                   b.name AS brand, c.name AS category,
                   (SELECT m.url FROM shop.product_media m
                    WHERE m.product_id = p.id
                    ORDER BY m.position, m.id LIMIT 1) AS image_url
            FROM shop.product p
            LEFT JOIN shop.brand b ON b.id = p.brand_id
            LEFT JOIN shop.category c ON c.id = p.category_id
            {LISTING_WHERE}
            ORDER BY {order}
            LIMIT $8 OFFSET $9
            ",
            order = filter.sort.order_by(),
        );

        let items = sqlx::query_as::<_, ProductSummary>(&sql)
            .bind(filter.include_inactive)
            .bind(pattern.as_deref())
            .bind(filter.brand.as_deref())
            .bind(filter.category.as_deref())
            .bind(filter.color)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        let count_sql = format!(
            r"
            SELECT COUNT(*)
            FROM shop.product p
            LEFT JOIN shop.brand b ON b.id = p.brand_id
            LEFT JOIN shop.category c ON c.id = p.category_id
            {LISTING_WHERE}
            "
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.include_inactive)
            .bind(pattern.as_deref())
            .bind(filter.brand.as_deref())
            .bind(filter.category.as_deref())
            .bind(filter.color)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .fetch_one(self.pool)
            .await?;

        Ok((items, total))
    }

    /// Look a product up by id or slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        product: &ProductRef,
        include_inactive: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let by = match product {
            ProductRef::Id(_) => "p.id",
            ProductRef::Slug(_) => "p.slug",
        };
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE {by} = $1 AND ($2 OR p.is_active)"
        );

        let query = sqlx::query_as::<_, ProductRow>(&sql);
        let query = match product {
            ProductRef::Id(id) => query.bind(*id),
            ProductRef::Slug(slug) => query.bind(slug.as_str()),
        };

        let row = query
            .bind(include_inactive)
            .fetch_optional(self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    /// Product page data: the product with its brand, category, colors,
    /// sizes and media.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(
        &self,
        product: &ProductRef,
        include_inactive: bool,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(product) = self.find(product, include_inactive).await? else {
            return Ok(None);
        };

        let brand = match product.brand_id {
            Some(id) => {
                sqlx::query_as::<_, Brand>(
                    "SELECT id, name, slug, created_at FROM shop.brand WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(self.pool)
                .await?
            }
            None => None,
        };
        let category = match product.category_id {
            Some(id) => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, slug, created_at FROM shop.category WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(self.pool)
                .await?
            }
            None => None,
        };
        let colors = TaxonomyRepository::new(self.pool)
            .colors_for_product(product.id)
            .await?;
        let media = self.media(product.id).await?;

        let mut sizes = self.size_labels(product.id).await?;
        if sizes.is_empty()
            && let Some(csv) = product.sizes_csv.as_deref()
        {
            sizes = parse_sizes_csv(csv).into_iter().map(str::to_owned).collect();
        }

        Ok(Some(ProductDetail {
            product,
            brand,
            category,
            colors,
            sizes,
            media,
        }))
    }

    /// Size labels from the product's size detail records, by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn size_labels(&self, product_id: ProductId) -> Result<Vec<String>, RepositoryError> {
        Ok(sqlx::query_scalar(
            "SELECT label FROM shop.product_size WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Images for a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn media(&self, product_id: ProductId) -> Result<Vec<ProductMedia>, RepositoryError> {
        Ok(sqlx::query_as::<_, ProductMedia>(
            r"
            SELECT id, product_id, url, file_name, content_type, position, created_at
            FROM shop.product_media
            WHERE product_id = $1
            ORDER BY position, id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Every order line ever placed for the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_history(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<HistoricalItem>, RepositoryError> {
        Ok(sqlx::query_as::<_, HistoricalItem>(
            r"
            SELECT title, sku, quantity::int8 AS quantity
            FROM shop.order_item
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Gather what the size-stock resolver needs for an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn size_stock_input(
        &self,
        product_id: ProductId,
    ) -> Result<Option<SizeStockInput>, RepositoryError> {
        let Some(product) = self.find(&ProductRef::Id(product_id), false).await? else {
            return Ok(None);
        };

        Ok(Some(SizeStockInput {
            declared_sizes: self.size_labels(product_id).await?,
            explicit: product.attributes.get(SIZE_STOCK_ATTRIBUTE).cloned(),
            sizes_csv: product.sizes_csv,
            total_stock: i64::from(product.stock),
            history: self.order_history(product_id).await?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_from_query_values() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap_or_default();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert_eq!(ProductSort::default(), ProductSort::Newest);
        assert!(ProductSort::Title.order_by().starts_with("p.title"));
    }
}
