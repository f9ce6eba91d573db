//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/register              - Create an unverified account, email a code
//! POST /api/auth/verify                - Confirm the emailed code, start a session
//! POST /api/auth/resend                - Issue a fresh code
//! POST /api/auth/login                 - Password login
//! POST /api/auth/logout                - End the session
//! GET  /api/auth/me                    - Current user
//!
//! # Catalog
//! GET  /api/products                   - Paginated product listing
//! GET  /api/products/{ref}             - Product detail (id or slug)
//! GET  /api/products/{ref}/delivery-estimate - Delivery window
//! GET  /api/products/{id}/sizes        - Remaining stock per size
//! GET  /api/brands | /api/categories | /api/colors
//!
//! # Cart, wishlist (requires auth)
//! GET|POST|DELETE /api/cart            - Show, add line, clear
//! PATCH|DELETE    /api/cart/{item_id}  - Change quantity, remove line
//! GET|POST        /api/wishlist        - Show, add
//! DELETE          /api/wishlist/{product_id}
//!
//! # Checkout and orders (requires auth)
//! POST /api/checkout                   - Place an order from the cart
//! GET  /api/orders                     - Order history
//! GET  /api/orders/{id}                - One order
//! POST /api/orders/{id}/pay            - Simulated payment
//! POST /api/orders/{id}/cancel         - Cancel a pending or paid order
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::Router;

use crate::state::AppState;

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/cart", cart::router())
        .nest("/api/wishlist", wishlist::router())
        .nest("/api", products::router().merge(orders::router()))
}
