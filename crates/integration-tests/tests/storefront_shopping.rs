//! Integration tests for customer flows: accounts, cart, wishlist and
//! checkout.
//!
//! These tests require both servers running against a migrated database,
//! `DATABASE_URL` for verifying test customers, and an admin test account.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use tidewear_integration_tests::{
    TEST_PASSWORD, admin_client, client, create_product, id_of, pool, signed_in_customer,
    sized_product, storefront_url, unique_email,
};

fn address() -> Value {
    json!({
        "shipping": {
            "name": "Test Customer",
            "line1": "Rua das Flores 12",
            "city": "Porto",
            "postal_code": "4000-001",
            "country": "PT"
        }
    })
}

async fn add_to_cart(client: &Client, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/api/cart", storefront_url()))
        .json(&body)
        .send()
        .await
        .expect("Failed to add to cart")
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unverified_login_is_forbidden() {
    let http = client();
    let base = storefront_url();
    let email = unique_email("unverified");

    let resp = http
        .post(format!("{base}/api/auth/register"))
        .json(&json!({"email": email, "password": TEST_PASSWORD, "name": "Pending"}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let again = http
        .post(format!("{base}/api/auth/register"))
        .json(&json!({"email": email, "password": TEST_PASSWORD, "name": "Pending"}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let login = http
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(login.status(), StatusCode::FORBIDDEN);

    let wrong_code = http
        .post(format!("{base}/api/auth/verify"))
        .json(&json!({"email": email, "code": "000000"}))
        .send()
        .await
        .expect("Failed to verify");
    assert_eq!(wrong_code.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_concurrent_resends_issue_one_code() {
    let http = client();
    let base = storefront_url();
    let email = unique_email("resend");

    let resp = http
        .post(format!("{base}/api/auth/register"))
        .json(&json!({"email": email, "password": TEST_PASSWORD, "name": "Resend"}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let too_soon = http
        .post(format!("{base}/api/auth/resend"))
        .json(&json!({"email": email}))
        .send()
        .await
        .expect("Failed to resend");
    assert_eq!(too_soon.status(), StatusCode::TOO_MANY_REQUESTS);
    let wait: i64 = too_soon.headers()["retry-after"]
        .to_str()
        .expect("Retry-After is not text")
        .parse()
        .expect("Retry-After is not a number");
    assert!((1..=60).contains(&wait));

    // Move the registration code out of the cooldown window.
    let db = pool().await;
    sqlx::query(
        r"
        UPDATE shop.email_otp SET created_at = NOW() - INTERVAL '2 minutes'
        WHERE user_id = (SELECT id FROM shop.user WHERE email = $1)
        ",
    )
    .bind(&email)
    .execute(&db)
    .await
    .expect("Failed to age code");

    let send = || {
        http.post(format!("{base}/api/auth/resend"))
            .json(&json!({"email": email}))
            .send()
    };
    let (a, b, c, d) = tokio::join!(send(), send(), send(), send());
    let statuses: Vec<StatusCode> = [a, b, c, d]
        .into_iter()
        .map(|r| r.expect("Failed to resend").status())
        .collect();
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
            .count(),
        3
    );

    let codes: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM shop.email_otp
        WHERE user_id = (SELECT id FROM shop.user WHERE email = $1)
        ",
    )
    .bind(&email)
    .fetch_one(&db)
    .await
    .expect("Failed to count codes");
    assert_eq!(codes, 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_session_lifecycle() {
    let http = client();
    let base = storefront_url();
    let email = signed_in_customer(&http).await;

    let me: Value = http
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get me")
        .json()
        .await
        .expect("Failed to parse me");
    assert_eq!(me["email"], email.as_str());

    let resp = http
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = http
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get me");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_requires_login() {
    let resp = client()
        .get(format!("{}/api/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_cart_size_rules() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(8)).await;
    let product_id = id_of(&product);

    let http = client();
    signed_in_customer(&http).await;

    let missing = add_to_cart(&http, json!({"product_id": product_id})).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let unknown = add_to_cart(&http, json!({"product_id": product_id, "size": "XXL"})).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let added = add_to_cart(&http, json!({"product_id": product_id, "size": "M", "quantity": 2})).await;
    assert_eq!(added.status(), StatusCode::CREATED);

    // Same product and size merges into one line.
    let merged = add_to_cart(&http, json!({"product_id": product_id, "size": "M"})).await;
    let cart: Value = merged.json().await.expect("Failed to parse cart");
    let items = cart["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().expect("line")["quantity"], 3);
    assert_eq!(cart["subtotal"], "75.00");
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_cart_update_and_remove() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(8)).await;

    let http = client();
    signed_in_customer(&http).await;
    let base = storefront_url();

    let cart: Value = add_to_cart(&http, json!({"product_id": id_of(&product), "size": "S"}))
        .await
        .json()
        .await
        .expect("Failed to parse cart");
    let line_id = id_of(&cart["items"][0]);

    let resp = http
        .patch(format!("{base}/api/cart/{line_id}"))
        .json(&json!({"quantity": 4}))
        .send()
        .await
        .expect("Failed to update line");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http
        .delete(format!("{base}/api/cart/{line_id}"))
        .send()
        .await
        .expect("Failed to remove line");
    assert!(resp.status().is_success());

    let resp = http
        .delete(format!("{base}/api/cart/{line_id}"))
        .send()
        .await
        .expect("Failed to remove line");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_wishlist() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(1)).await;
    let product_id = id_of(&product);

    let http = client();
    signed_in_customer(&http).await;
    let base = storefront_url();

    for _ in 0..2 {
        let resp = http
            .post(format!("{base}/api/wishlist"))
            .json(&json!({"product_id": product_id}))
            .send()
            .await
            .expect("Failed to add to wishlist");
        assert!(resp.status().is_success());
    }

    let list: Value = http
        .get(format!("{base}/api/wishlist"))
        .send()
        .await
        .expect("Failed to list wishlist")
        .json()
        .await
        .expect("Failed to parse wishlist");
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let resp = http
        .delete(format!("{base}/api/wishlist/{product_id}"))
        .send()
        .await
        .expect("Failed to remove from wishlist");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = http
        .delete(format!("{base}/api/wishlist/{product_id}"))
        .send()
        .await
        .expect("Failed to remove from wishlist");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_checkout_pay_and_cancel() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(6)).await;

    let http = client();
    signed_in_customer(&http).await;
    let base = storefront_url();

    let empty = http
        .post(format!("{base}/api/checkout"))
        .json(&address())
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    add_to_cart(&http, json!({"product_id": id_of(&product), "size": "L"})).await;
    let resp = http
        .post(format!("{base}/api/checkout"))
        .json(&address())
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("Failed to parse order");
    let order_id = id_of(&order);
    assert_eq!(order["status"], "pending");

    // The order line "<title> - L" now counts against size L.
    let sizes: Value = http
        .get(format!("{base}/api/products/{}/sizes", id_of(&product)))
        .send()
        .await
        .expect("Failed to get sizes")
        .json()
        .await
        .expect("Failed to parse sizes");
    assert_eq!(sizes["sizes"], json!({"S": 6, "M": 6, "L": 5}));

    let cart: Value = http
        .get(format!("{base}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    let failed: Value = http
        .post(format!("{base}/api/orders/{order_id}/pay"))
        .json(&json!({"outcome": "fail"}))
        .send()
        .await
        .expect("Failed to pay")
        .json()
        .await
        .expect("Failed to parse order");
    assert_eq!(failed["status"], "pending");
    assert_eq!(failed["payment_status"], "failed");

    let paid: Value = http
        .post(format!("{base}/api/orders/{order_id}/pay"))
        .send()
        .await
        .expect("Failed to pay")
        .json()
        .await
        .expect("Failed to parse order");
    assert_eq!(paid["status"], "paid");

    let again = http
        .post(format!("{base}/api/orders/{order_id}/pay"))
        .send()
        .await
        .expect("Failed to pay");
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let cancelled: Value = http
        .post(format!("{base}/api/orders/{order_id}/cancel"))
        .send()
        .await
        .expect("Failed to cancel")
        .json()
        .await
        .expect("Failed to parse order");
    assert_eq!(cancelled["status"], "cancelled");

    let other = client();
    signed_in_customer(&other).await;
    let resp = other
        .get(format!("{base}/api/orders/{order_id}"))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
