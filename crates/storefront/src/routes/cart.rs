//! Cart routes. Every route requires a logged-in customer.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tidewear_core::db::products::Product;
use tidewear_core::db::{ProductRepository, TaxonomyRepository};
use tidewear_core::inventory::parse_sizes_csv;
use tidewear_core::{CartItemId, ColorId, Price, ProductId, ProductRef};

use crate::db::CartRepository;
use crate::db::cart::{CartLine, MAX_LINE_QUANTITY};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Build the cart router (mounted at `/api/cart`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).post(add).delete(clear))
        .route("/{item_id}", patch(update).delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
    pub size: Option<String>,
    pub color_id: Option<ColorId>,
}

const fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Price,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineView>,
    pub subtotal: Price,
    pub item_count: i64,
}

impl From<Vec<CartLine>> for CartResponse {
    fn from(lines: Vec<CartLine>) -> Self {
        let subtotal = Price::sum(lines.iter().map(CartLine::line_total));
        let item_count = lines.iter().map(|line| i64::from(line.quantity)).sum();
        let items = lines
            .into_iter()
            .map(|line| CartLineView {
                line_total: line.line_total(),
                line,
            })
            .collect();

        Self {
            items,
            subtotal,
            item_count,
        }
    }
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )))
    }
}

/// Check the requested size against the product's sizes.
///
/// Products that declare no sizes take no size; anything sent is dropped.
fn choose_size(requested: Option<&str>, declared: &[String]) -> Result<Option<String>> {
    let requested = requested.map(str::trim).filter(|s| !s.is_empty());
    if declared.is_empty() {
        return Ok(None);
    }
    match requested {
        Some(size) if declared.iter().any(|d| d == size) => Ok(Some(size.to_owned())),
        Some(size) => Err(AppError::BadRequest(format!("unknown size: {size}"))),
        None => Err(AppError::BadRequest("size is required".to_owned())),
    }
}

fn declared_sizes(product: &Product, labels: Vec<String>) -> Vec<String> {
    if !labels.is_empty() {
        return labels;
    }
    product
        .sizes_csv
        .as_deref()
        .map(parse_sizes_csv)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;
    Ok(Json(lines.into()))
}

/// Add a product, merging with an identical line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddRequest>,
) -> Result<(StatusCode, Json<CartResponse>)> {
    validate_quantity(body.quantity)?;

    let products = ProductRepository::new(state.pool());
    let product = products
        .find(&ProductRef::Id(body.product_id), false)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let labels = products.size_labels(product.id).await?;
    let size = choose_size(body.size.as_deref(), &declared_sizes(&product, labels))?;

    if let Some(color_id) = body.color_id {
        let colors = TaxonomyRepository::new(state.pool())
            .colors_for_product(product.id)
            .await?;
        if !colors.iter().any(|c| c.id == color_id) {
            return Err(AppError::BadRequest(format!("unknown color: {color_id}")));
        }
    }

    let cart = CartRepository::new(state.pool());
    cart.add(user.id, product.id, body.quantity, size.as_deref(), body.color_id)
        .await?;

    let lines = cart.lines(user.id).await?;
    Ok((StatusCode::CREATED, Json(lines.into())))
}

/// Change a line's quantity; zero removes it.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool());
    let found = if body.quantity == 0 {
        cart.remove(user.id, item_id).await?
    } else {
        validate_quantity(body.quantity)?;
        cart.set_quantity(user.id, item_id, body.quantity).await?
    };
    if !found {
        return Err(AppError::NotFound(format!("cart item {item_id}")));
    }

    Ok(Json(cart.lines(user.id).await?.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool());
    if !cart.remove(user.id, item_id).await? {
        return Err(AppError::NotFound(format!("cart item {item_id}")));
    }
    Ok(Json(cart.lines(user.id).await?.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
