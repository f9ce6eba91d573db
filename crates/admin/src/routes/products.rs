//! Product management.
//!
//! The detail view also carries the resolved per-size stock so admins see
//! exactly what the storefront will report.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use tidewear_core::db::ProductRepository;
use tidewear_core::db::products::{
    Product, ProductDetail, ProductFilter, ProductSort, ProductSummary, SIZE_STOCK_ATTRIBUTE,
};
use tidewear_core::{
    BrandId, CategoryId, ColorId, Page, PageParams, Price, ProductId, ProductRef, SizeStock,
    SizeStockInput, Slug, resolve_size_stock,
};

use crate::db::CatalogRepository;
use crate::db::catalog::{ProductWrite, normalize_sizes};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_TITLE_LENGTH: usize = 200;

/// Build the product router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", get(show).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub sort: Option<ProductSort>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            query: self.q.clone(),
            brand: self.brand.clone().filter(|b| !b.trim().is_empty()),
            category: self.category.clone().filter(|c| !c.trim().is_empty()),
            sort: self.sort.unwrap_or_default(),
            include_inactive: true,
            ..ProductFilter::default()
        }
    }

    const fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Create/update body.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub sku: Option<String>,
    pub price: Price,
    pub stock: i64,
    pub sizes: Option<Vec<String>>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub color_ids: Option<Vec<ColorId>>,
    pub attributes: Option<Value>,
    pub is_active: Option<bool>,
}

impl ProductRequest {
    fn into_write(self) -> Result<ProductWrite> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_owned()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::BadRequest(format!(
                "title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
        let slug = Slug::explicit_or_from(self.slug.as_deref(), title)
            .map_err(|e| AppError::BadRequest(format!("slug: {e}")))?;

        let stock = u32::try_from(self.stock)
            .ok()
            .filter(|s| i32::try_from(*s).is_ok())
            .ok_or_else(|| AppError::BadRequest("stock must be a non-negative count".to_owned()))?;

        let sizes = self
            .sizes
            .as_deref()
            .map(normalize_sizes)
            .transpose()
            .map_err(|label| {
                AppError::BadRequest(format!("size label cannot contain a comma: {label}"))
            })?;

        if let Some(attributes) = &self.attributes {
            validate_attributes(attributes)?;
        }

        Ok(ProductWrite {
            title: title.to_owned(),
            slug,
            description: self.description.trim().to_owned(),
            sku: self
                .sku
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            price: self.price,
            stock,
            brand_id: self.brand_id,
            category_id: self.category_id,
            sizes,
            color_ids: self.color_ids,
            attributes: self.attributes,
            is_active: self.is_active,
        })
    }
}

/// Attributes are free-form but must be an object, and a `sizeStock`
/// entry, if present, must itself be an object.
fn validate_attributes(attributes: &Value) -> Result<()> {
    let Some(object) = attributes.as_object() else {
        return Err(AppError::BadRequest(
            "attributes must be a JSON object".to_owned(),
        ));
    };
    if let Some(size_stock) = object.get(SIZE_STOCK_ATTRIBUTE)
        && !size_stock.is_object()
    {
        return Err(AppError::BadRequest(format!(
            "attributes.{SIZE_STOCK_ATTRIBUTE} must be an object"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AdminProductDetail {
    #[serde(flatten)]
    pub detail: ProductDetail,
    pub size_stock: SizeStock,
}

/// Every product, active or not.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ProductSummary>>> {
    let params = query.page_params();
    let (items, total) = ProductRepository::new(state.pool())
        .list(&query.filter(), params.limit(), params.offset())
        .await?;
    Ok(Json(Page::new(items, params, total)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<AdminProductDetail>> {
    let products = ProductRepository::new(state.pool());
    let detail = products
        .detail(&ProductRef::Id(id), true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let input = SizeStockInput {
        declared_sizes: detail.sizes.clone(),
        sizes_csv: detail.product.sizes_csv.clone(),
        total_stock: i64::from(detail.product.stock),
        history: products.order_history(id).await?,
        explicit: detail.product.attributes.get(SIZE_STOCK_ATTRIBUTE).cloned(),
    };

    Ok(Json(AdminProductDetail {
        size_stock: resolve_size_stock(&input),
        detail,
    }))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let write = body.into_write()?;
    let product = CatalogRepository::new(state.pool()).create(&write).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let write = body.into_write()?;
    Ok(Json(
        CatalogRepository::new(state.pool()).update(id, &write).await?,
    ))
}

/// Delete a product. Uploaded image files are removed best effort.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let media = ProductRepository::new(state.pool()).media(id).await?;
    CatalogRepository::new(state.pool()).delete(id).await?;

    for item in media {
        if let Err(e) = state.media().delete(&item.file_name).await {
            tracing::warn!(error = %e, file = %item.file_name, "Could not remove media file");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(body: Value) -> ProductRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_minimal_request() {
        let write = request(json!({"title": " Linen Shirt ", "price": "49.90", "stock": 12}))
            .into_write()
            .unwrap();
        assert_eq!(write.title, "Linen Shirt");
        assert_eq!(write.slug.as_str(), "linen-shirt");
        assert_eq!(write.stock, 12);
        assert!(write.sizes.is_none());
        assert!(write.attributes.is_none());
        assert!(write.is_active.is_none());
    }

    #[test]
    fn test_sizes_are_normalized() {
        let write = request(json!({
            "title": "Tee", "price": 10, "stock": 3, "sizes": [" S", "M", "S", ""]
        }))
        .into_write()
        .unwrap();
        assert_eq!(write.sizes.unwrap(), vec!["S".to_owned(), "M".to_owned()]);

        let comma = request(json!({"title": "Tee", "price": 10, "stock": 3, "sizes": ["S,M"]}));
        assert!(matches!(comma.into_write(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let body = request(json!({"title": "Tee", "price": 10, "stock": -1}));
        assert!(matches!(body.into_write(), Err(AppError::BadRequest(_))));

        let body = request(json!({"title": "Tee", "price": 10, "stock": 3_000_000_000_i64}));
        assert!(matches!(body.into_write(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_attributes_must_be_object() {
        let ok = request(json!({
            "title": "Tee", "price": 10, "stock": 1,
            "attributes": {"material": "cotton", "sizeStock": {"S": 2}}
        }));
        assert!(ok.into_write().is_ok());

        let array = request(json!({"title": "Tee", "price": 10, "stock": 1, "attributes": [1]}));
        assert!(matches!(array.into_write(), Err(AppError::BadRequest(_))));

        let bad_map = request(json!({
            "title": "Tee", "price": 10, "stock": 1, "attributes": {"sizeStock": "S:2"}
        }));
        assert!(matches!(bad_map.into_write(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_blank_title_rejected() {
        let body = request(json!({"title": "  ", "price": 10, "stock": 1}));
        assert!(matches!(body.into_write(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_list_query_includes_inactive() {
        let filter = ListQuery::default().filter();
        assert!(filter.include_inactive);
        assert_eq!(filter.sort, ProductSort::Newest);
    }
}
