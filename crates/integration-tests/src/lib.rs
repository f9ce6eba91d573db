//! Integration tests for Tidewear.
//!
//! Every test talks to running servers over HTTP and is `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p tidewear-cli -- migrate
//! cargo run -p tidewear-cli -- admin create -e "$ADMIN_TEST_EMAIL" -n Tests -p "$ADMIN_TEST_PASSWORD"
//! cargo run -p tidewear-storefront &
//! cargo run -p tidewear-admin &
//! cargo test -p tidewear-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` (default `http://localhost:3000`)
//! - `ADMIN_BASE_URL` (default `http://localhost:3001`)
//! - `DATABASE_URL` - used to mark test customers verified, since the
//!   emailed code is never visible to the tests
//! - `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD` - an existing admin account

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "tide-pool-8831";

fn env_or(key: &str, default: &str) -> String {
    dotenvy::dotenv().ok();
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[must_use]
pub fn storefront_url() -> String {
    env_or("STOREFRONT_BASE_URL", "http://localhost:3000")
}

#[must_use]
pub fn admin_url() -> String {
    env_or("ADMIN_BASE_URL", "http://localhost:3001")
}

/// A client that keeps session cookies between requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Connection to the shared database.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or unreachable.
pub async fn pool() -> PgPool {
    let url = env_or("DATABASE_URL", "");
    assert!(!url.is_empty(), "DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// An address unique to this run.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@tidewear.test", Uuid::new_v4().simple())
}

/// Register a customer, mark it verified, and log in with `client`.
///
/// # Panics
///
/// Panics if any step fails.
pub async fn signed_in_customer(client: &Client) -> String {
    let base = storefront_url();
    let email = unique_email("customer");

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({"email": email, "password": TEST_PASSWORD, "name": "Test Customer"}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    sqlx::query("UPDATE shop.user SET email_verified = TRUE WHERE email = $1")
        .bind(&email)
        .execute(&pool().await)
        .await
        .expect("Failed to verify customer");

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    email
}

/// A client logged into the admin API.
///
/// # Panics
///
/// Panics if the admin test account is missing or the login fails.
pub async fn admin_client() -> Client {
    let client = client();
    let email = env_or("ADMIN_TEST_EMAIL", "");
    let password = env_or("ADMIN_TEST_PASSWORD", "");
    assert!(
        !email.is_empty() && !password.is_empty(),
        "ADMIN_TEST_EMAIL and ADMIN_TEST_PASSWORD must be set"
    );

    let resp = client
        .post(format!("{}/api/auth/login", admin_url()))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Failed to log in as admin");
    assert_eq!(resp.status(), StatusCode::OK);
    client
}

/// Create an active product through the admin API and return its JSON.
///
/// # Panics
///
/// Panics if the product cannot be created.
pub async fn create_product(admin: &Client, body: Value) -> Value {
    let resp = admin
        .post(format!("{}/api/products", admin_url()))
        .json(&body)
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse product")
}

/// A product body with a unique title, sized S/M/L.
#[must_use]
pub fn sized_product(stock: u32) -> Value {
    let suffix = Uuid::new_v4().simple().to_string();
    json!({
        "title": format!("Test Tee {suffix}"),
        "description": "Integration test product",
        "sku": format!("TEE-{suffix}"),
        "price": "25.00",
        "stock": stock,
        "sizes": ["S", "M", "L"],
    })
}

/// Numeric id from a JSON object's `id` field.
///
/// # Panics
///
/// Panics if `id` is not an integer.
#[must_use]
pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("missing id")
}
