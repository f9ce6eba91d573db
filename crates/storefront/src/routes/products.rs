//! Public catalog routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tidewear_core::db::products::{ProductDetail, ProductFilter, ProductSort, ProductSummary};
use tidewear_core::db::taxonomy::{Brand, Category, Color};
use tidewear_core::db::{ProductRepository, ShippingSettingsRepository, TaxonomyRepository};
use tidewear_core::{
    ColorId, DeliveryRange, Page, PageParams, ProductRef, ShippingSettings, SizeStock,
    estimate_delivery, resolve_size_stock,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the catalog router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list))
        .route("/products/{product}", get(show))
        .route("/products/{product}/delivery-estimate", get(delivery_estimate))
        .route("/products/{product}/sizes", get(sizes))
        .route("/brands", get(brands))
        .route("/categories", get(categories))
        .route("/colors", get(colors))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub color: Option<ColorId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<ProductSort>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            query: non_blank(self.q.as_deref()),
            brand: non_blank(self.brand.as_deref()),
            category: non_blank(self.category.as_deref()),
            color: self.color,
            min_price: self.min_price,
            max_price: self.max_price,
            sort: self.sort.unwrap_or_default(),
            include_inactive: false,
        }
    }

    const fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

#[derive(Debug, Serialize)]
pub struct SizesResponse {
    pub sizes: SizeStock,
}

/// Paginated listing of active products.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ProductSummary>>> {
    let params = query.page_params();
    let (items, total) = ProductRepository::new(state.pool())
        .list(&query.filter(), params.limit(), params.offset())
        .await?;

    Ok(Json(Page::new(items, params, total)))
}

/// Product detail by id or slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(product): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product_ref = ProductRef::parse(&product);
    let detail = ProductRepository::new(state.pool())
        .detail(&product_ref, false)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_ref}")))?;

    Ok(Json(detail))
}

/// Earliest and latest delivery day for an order placed now.
///
/// The shipping settings are best effort: if they cannot be read the
/// default timings are used and the failure is only logged.
#[instrument(skip(state))]
pub async fn delivery_estimate(
    State(state): State<AppState>,
    Path(product): Path<String>,
) -> Result<Json<DeliveryRange>> {
    let product_ref = ProductRef::parse(&product);
    ProductRepository::new(state.pool())
        .find(&product_ref, false)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_ref}")))?;

    let settings = ShippingSettingsRepository::new(state.pool())
        .get_or_default()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Shipping settings unavailable, using defaults");
            ShippingSettings::default()
        });

    Ok(Json(estimate_delivery(Utc::now(), &settings).range()))
}

/// Remaining stock per size. Only numeric product ids are accepted.
#[instrument(skip(state))]
pub async fn sizes(
    State(state): State<AppState>,
    Path(product): Path<String>,
) -> Result<Json<SizesResponse>> {
    let not_found = || AppError::NotFound(format!("product {product}"));
    let product_id = ProductRef::parse(&product).id().ok_or_else(not_found)?;

    let input = ProductRepository::new(state.pool())
        .size_stock_input(product_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(SizesResponse {
        sizes: resolve_size_stock(&input),
    }))
}

#[instrument(skip(state))]
pub async fn brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    Ok(Json(TaxonomyRepository::new(state.pool()).brands().await?))
}

#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(TaxonomyRepository::new(state.pool()).categories().await?))
}

#[instrument(skip(state))]
pub async fn colors(State(state): State<AppState>) -> Result<Json<Vec<Color>>> {
    Ok(Json(TaxonomyRepository::new(state.pool()).colors().await?))
}
