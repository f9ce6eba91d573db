//! Brand, category and color management.
//!
//! Brands and categories take `{name, slug?}`; without a slug one is derived
//! from the name. Colors take `{name, hex}` with hex as `#RRGGBB`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::db::TaxonomyRepository;
use tidewear_core::db::taxonomy::{Brand, Category, Color};
use tidewear_core::{BrandId, CategoryId, ColorId, Slug};

use crate::db::TaxonomyWriteRepository;
use crate::db::taxonomy::normalize_hex;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 100;

/// Build the taxonomy router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/brands", get(list_brands).post(create_brand))
        .route("/brands/{id}", put(update_brand).delete(delete_brand))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/colors", get(list_colors).post(create_color))
        .route("/colors/{id}", put(update_color).delete(delete_color))
}

#[derive(Debug, Deserialize)]
pub struct NamedRequest {
    pub name: String,
    pub slug: Option<String>,
}

impl NamedRequest {
    fn validate(&self) -> Result<(&str, Slug)> {
        let name = validate_name(&self.name)?;
        let slug = Slug::explicit_or_from(self.slug.as_deref(), name)
            .map_err(|e| AppError::BadRequest(format!("slug: {e}")))?;
        Ok((name, slug))
    }
}

#[derive(Debug, Deserialize)]
pub struct ColorRequest {
    pub name: String,
    pub hex: String,
}

impl ColorRequest {
    fn validate(&self) -> Result<(&str, String)> {
        let name = validate_name(&self.name)?;
        let hex = normalize_hex(&self.hex)
            .ok_or_else(|| AppError::BadRequest("hex must look like #RRGGBB".to_owned()))?;
        Ok((name, hex))
    }
}

fn validate_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

// =============================================================================
// Brands
// =============================================================================

#[instrument(skip_all)]
pub async fn list_brands(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Brand>>> {
    Ok(Json(TaxonomyRepository::new(state.pool()).brands().await?))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_brand(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<NamedRequest>,
) -> Result<(StatusCode, Json<Brand>)> {
    let (name, slug) = body.validate()?;
    let brand = TaxonomyWriteRepository::new(state.pool())
        .create_brand(name, &slug)
        .await?;
    tracing::info!(brand_id = %brand.id, %slug, "Brand created");
    Ok((StatusCode::CREATED, Json(brand)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_brand(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BrandId>,
    Json(body): Json<NamedRequest>,
) -> Result<Json<Brand>> {
    let (name, slug) = body.validate()?;
    Ok(Json(
        TaxonomyWriteRepository::new(state.pool())
            .update_brand(id, name, &slug)
            .await?,
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_brand(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BrandId>,
) -> Result<StatusCode> {
    TaxonomyWriteRepository::new(state.pool())
        .delete_brand(id)
        .await?;
    tracing::info!(brand_id = %id, "Brand deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

#[instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(TaxonomyRepository::new(state.pool()).categories().await?))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<NamedRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let (name, slug) = body.validate()?;
    let category = TaxonomyWriteRepository::new(state.pool())
        .create_category(name, &slug)
        .await?;
    tracing::info!(category_id = %category.id, %slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(body): Json<NamedRequest>,
) -> Result<Json<Category>> {
    let (name, slug) = body.validate()?;
    Ok(Json(
        TaxonomyWriteRepository::new(state.pool())
            .update_category(id, name, &slug)
            .await?,
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    TaxonomyWriteRepository::new(state.pool())
        .delete_category(id)
        .await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Colors
// =============================================================================

#[instrument(skip_all)]
pub async fn list_colors(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Color>>> {
    Ok(Json(TaxonomyRepository::new(state.pool()).colors().await?))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_color(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<ColorRequest>,
) -> Result<(StatusCode, Json<Color>)> {
    let (name, hex) = body.validate()?;
    let color = TaxonomyWriteRepository::new(state.pool())
        .create_color(name, &hex)
        .await?;
    Ok((StatusCode::CREATED, Json(color)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_color(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ColorId>,
    Json(body): Json<ColorRequest>,
) -> Result<Json<Color>> {
    let (name, hex) = body.validate()?;
    Ok(Json(
        TaxonomyWriteRepository::new(state.pool())
            .update_color(id, name, &hex)
            .await?,
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_color(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ColorId>,
) -> Result<StatusCode> {
    TaxonomyWriteRepository::new(state.pool())
        .delete_color(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
