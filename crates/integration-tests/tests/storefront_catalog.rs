//! Integration tests for the public catalog: listing, delivery estimates
//! and per-size stock.
//!
//! These tests require both servers running against a migrated database
//! and an admin test account (see the crate docs).

use reqwest::StatusCode;
use serde_json::{Value, json};

use tidewear_integration_tests::{
    admin_client, admin_url, client, create_product, id_of, sized_product, storefront_url,
};

/// `"DD Mon"`, e.g. `"07 Mar"`.
fn is_day_month(value: &str) -> bool {
    let bytes = value.as_bytes();
    value.len() == 6
        && bytes.first().is_some_and(u8::is_ascii_digit)
        && bytes.get(1).is_some_and(u8::is_ascii_digit)
        && bytes.get(2) == Some(&b' ')
        && value.get(3..).is_some_and(|m| m.chars().all(|c| c.is_ascii_alphabetic()))
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_product_listing_and_detail() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(5)).await;
    let slug = product["slug"].as_str().expect("slug").to_string();
    let base = storefront_url();
    let http = client();

    let page: Value = http
        .get(format!("{base}/api/products?q={slug}"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse page");
    assert!(page["total"].as_i64().unwrap_or_default() >= 1);
    assert!(page["items"].is_array());

    for key in [slug.clone(), id_of(&product).to_string()] {
        let resp = http
            .get(format!("{base}/api/products/{key}"))
            .send()
            .await
            .expect("Failed to get product");
        assert_eq!(resp.status(), StatusCode::OK, "lookup by {key}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_not_found() {
    let base = storefront_url();
    for path in [
        "/api/products/no-such-product",
        "/api/products/2147483000/delivery-estimate",
        "/api/products/2147483000/sizes",
    ] {
        let resp = client()
            .get(format!("{base}{path}"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = resp.json().await.expect("Failed to parse error");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_delivery_estimate_shape() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(3)).await;

    let range: Value = client()
        .get(format!(
            "{}/api/products/{}/delivery-estimate",
            storefront_url(),
            id_of(&product)
        ))
        .send()
        .await
        .expect("Failed to get estimate")
        .json()
        .await
        .expect("Failed to parse estimate");

    let start = range["start"].as_str().expect("start");
    let end = range["end"].as_str().expect("end");
    assert!(is_day_month(start), "bad start {start}");
    assert!(is_day_month(end), "bad end {end}");
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_sizes_inferred_from_total_stock() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(10)).await;

    let resp = client()
        .get(format!("{}/api/products/{}/sizes", storefront_url(), id_of(&product)))
        .send()
        .await
        .expect("Failed to get sizes");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse sizes");
    assert_eq!(body, json!({"sizes": {"S": 10, "M": 10, "L": 10}}));
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_sizes_prefer_explicit_map() {
    let admin = admin_client().await;
    let mut body = sized_product(10);
    body["attributes"] = json!({"sizeStock": {"S": 1, "M": 0}});
    let product = create_product(&admin, body).await;

    let sizes: Value = client()
        .get(format!("{}/api/products/{}/sizes", storefront_url(), id_of(&product)))
        .send()
        .await
        .expect("Failed to get sizes")
        .json()
        .await
        .expect("Failed to parse sizes");
    assert_eq!(sizes["sizes"], json!({"S": 1, "M": 0}));
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_sizes_require_numeric_id_and_active_product() {
    let admin = admin_client().await;
    let mut body = sized_product(4);
    body["is_active"] = json!(false);
    let product = create_product(&admin, body).await;
    let base = storefront_url();

    let by_slug = client()
        .get(format!("{base}/api/products/{}/sizes", product["slug"].as_str().expect("slug")))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(by_slug.status(), StatusCode::NOT_FOUND);

    let inactive = client()
        .get(format!("{base}/api/products/{}/sizes", id_of(&product)))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(inactive.status(), StatusCode::NOT_FOUND);

    // Still visible to admins.
    let resp = admin
        .get(format!("{}/api/products/{}", admin_url(), id_of(&product)))
        .send()
        .await
        .expect("Failed to get admin product");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_day_month_helper() {
    assert!(is_day_month("07 Mar"));
    assert!(!is_day_month("7 Mar"));
    assert!(!is_day_month("2024-03-07"));
}
