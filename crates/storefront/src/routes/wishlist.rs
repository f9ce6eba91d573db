//! Wishlist routes. Every route requires a logged-in customer.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::db::ProductRepository;
use tidewear_core::{ProductId, ProductRef};

use crate::db::WishlistRepository;
use crate::db::wishlist::WishlistEntry;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Build the wishlist router (mounted at `/api/wishlist`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(add))
        .route("/{product_id}", delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<WishlistEntry>>> {
    Ok(Json(WishlistRepository::new(state.pool()).list(user.id).await?))
}

/// Save a product. Saving it twice is a no-op.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddRequest>,
) -> Result<Json<Vec<WishlistEntry>>> {
    ProductRepository::new(state.pool())
        .find(&ProductRef::Id(body.product_id), false)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let wishlist = WishlistRepository::new(state.pool());
    wishlist.add(user.id, body.product_id).await?;
    Ok(Json(wishlist.list(user.id).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    if !WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?
    {
        return Err(AppError::NotFound(format!("wishlist product {product_id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
