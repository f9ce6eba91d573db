//! Checkout and order history routes. Every route requires a logged-in
//! customer, and customers only ever see their own orders.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::db::orders::{Order, OrderSummary, ShippingAddress};
use tidewear_core::db::{OrderRepository, RepositoryError};
use tidewear_core::{OrderId, OrderStatus, Page, PageParams};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::checkout::{CheckoutService, PaymentOutcome};
use crate::state::AppState;

/// Build the checkout and order router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/orders", get(list))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/pay", post(pay))
        .route("/orders/{id}/cancel", post(cancel))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping: ShippingAddress,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    #[serde(default)]
    pub outcome: PaymentOutcome,
}

/// Turn the cart into a pending order.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.pool())
        .place_order(user.id, body.shipping)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Order history, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderSummary>>> {
    let (items, total) = OrderRepository::new(state.pool())
        .list(Some(user.id), None, params.limit(), params.offset())
        .await?;
    Ok(Json(Page::new(items, params, total)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id, Some(user.id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Simulated payment. An empty body means `succeed`.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    body: Option<Json<PayRequest>>,
) -> Result<Json<Order>> {
    let outcome = body.map(|Json(b)| b.outcome).unwrap_or_default();
    let order = CheckoutService::new(state.pool())
        .pay(user.id, id, outcome)
        .await?;
    Ok(Json(order))
}

/// Cancel a pending or paid order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .transition(id, Some(user.id), OrderStatus::Cancelled)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("order {id}")),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Database(other),
        })?;
    Ok(Json(order))
}
