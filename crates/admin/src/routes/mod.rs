//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/login                    - Password login (admins only)
//! POST   /api/auth/logout                   - End the session
//! GET    /api/auth/me                       - Current admin
//!
//! # Taxonomy
//! GET|POST       /api/brands                - List, create
//! PUT|DELETE     /api/brands/{id}           - Update, delete
//! GET|POST       /api/categories            - List, create
//! PUT|DELETE     /api/categories/{id}       - Update, delete
//! GET|POST       /api/colors                - List, create
//! PUT|DELETE     /api/colors/{id}           - Update, delete
//!
//! # Products and media
//! GET|POST       /api/products              - List (incl. inactive), create
//! GET|PUT|DELETE /api/products/{id}         - Detail, update, delete
//! POST           /api/products/{id}/media   - Upload an image (multipart `file`)
//! PUT            /api/products/{id}/media/order - Reorder images
//! DELETE         /api/media/{id}            - Remove an image
//!
//! # Store
//! GET|PUT        /api/shipping              - Shipping settings
//! GET            /api/users                 - Search users
//! PATCH|DELETE   /api/users/{id}            - Change role/name, delete
//! GET            /api/orders                - Orders, filter by status
//! GET|PATCH      /api/orders/{id}           - Detail, change status
//! ```
//!
//! Every route except login requires [`crate::middleware::RequireAdmin`].

pub mod auth;
pub mod media;
pub mod orders;
pub mod products;
pub mod shipping;
pub mod taxonomy;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create all API routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api/auth", auth::router()).nest(
        "/api",
        Router::new()
            .merge(taxonomy::router())
            .merge(products::router())
            .merge(media::router())
            .merge(shipping::router())
            .merge(users::router())
            .merge(orders::router()),
    )
}
