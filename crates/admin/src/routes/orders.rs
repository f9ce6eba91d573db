//! Order management. Status changes follow the same transition rules the
//! storefront enforces for cancellation.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::db::OrderRepository;
use tidewear_core::db::orders::{Order, OrderSummary};
use tidewear_core::{OrderId, OrderStatus, Page, PageParams};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Build the order router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list))
        .route("/orders/{id}", get(show).patch(update_status))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// All orders, newest first.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<OrderSummary>>> {
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let (items, total) = OrderRepository::new(state.pool())
        .list(None, query.status, params.limit(), params.offset())
        .await?;
    Ok(Json(Page::new(items, params, total)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id, None)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Move an order along its lifecycle; invalid transitions are 409.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Order>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .transition(id, None, body.status)
            .await?,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Uri;

    use super::*;

    #[test]
    fn test_order_query_parses_status() {
        let uri: Uri = "/api/orders?status=paid&page=2".parse().unwrap();
        let Query(query) = Query::<OrderQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Paid));
        assert_eq!(query.page, Some(2));

        let bad: Uri = "/api/orders?status=lost".parse().unwrap();
        assert!(Query::<OrderQuery>::try_from_uri(&bad).is_err());
    }
}
