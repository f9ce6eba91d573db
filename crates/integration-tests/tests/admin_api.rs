//! Integration tests for the admin JSON API.
//!
//! These tests require:
//! - A migrated database (`tw-cli migrate`)
//! - Both servers running
//! - `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD` for an admin created with
//!   `tw-cli admin create`

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use tidewear_integration_tests::{
    admin_client, admin_url, client, create_product, id_of, signed_in_customer, sized_product,
    storefront_url,
};

/// Smallest valid PNG signature; the server only checks the declared type.
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

async fn upload(admin: &Client, product_id: i64, content_type: &str) -> reqwest::Response {
    let part = Part::bytes(PNG_BYTES.to_vec())
        .file_name("front.png")
        .mime_str(content_type)
        .expect("Invalid mime type");
    admin
        .post(format!("{}/api/products/{product_id}/media", admin_url()))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .expect("Failed to upload media")
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_routes_require_session() {
    let base = admin_url();
    for path in ["/api/products", "/api/users", "/api/orders", "/api/shipping"] {
        let resp = client()
            .get(format!("{base}{path}"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_customer_cannot_log_into_admin() {
    let http = client();
    let email = signed_in_customer(&http).await;

    let resp = client()
        .post(format!("{}/api/auth/login", admin_url()))
        .json(&json!({"email": email, "password": tidewear_integration_tests::TEST_PASSWORD}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_bad_admin_password() {
    let resp = client()
        .post(format!("{}/api/auth/login", admin_url()))
        .json(&json!({"email": "nobody@tidewear.test", "password": "definitely-wrong"}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_logout_ends_session() {
    let admin = admin_client().await;
    let base = admin_url();

    let resp = admin
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get me");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Taxonomy
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_brand_crud() {
    let admin = admin_client().await;
    let base = admin_url();
    let slug = format!("brand-{}", Uuid::new_v4().simple());

    let resp = admin
        .post(format!("{base}/api/brands"))
        .json(&json!({"name": "Test Brand", "slug": slug}))
        .send()
        .await
        .expect("Failed to create brand");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let brand: Value = resp.json().await.expect("Failed to parse brand");
    let brand_id = id_of(&brand);

    let duplicate = admin
        .post(format!("{base}/api/brands"))
        .json(&json!({"name": "Another", "slug": slug}))
        .send()
        .await
        .expect("Failed to create brand");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let renamed: Value = admin
        .put(format!("{base}/api/brands/{brand_id}"))
        .json(&json!({"name": "Renamed Brand", "slug": slug}))
        .send()
        .await
        .expect("Failed to update brand")
        .json()
        .await
        .expect("Failed to parse brand");
    assert_eq!(renamed["name"], "Renamed Brand");

    let public: Value = client()
        .get(format!("{}/api/brands", storefront_url()))
        .send()
        .await
        .expect("Failed to list brands")
        .json()
        .await
        .expect("Failed to parse brands");
    assert!(
        public
            .as_array()
            .expect("brands")
            .iter()
            .any(|b| b["slug"] == slug.as_str())
    );

    let resp = admin
        .delete(format!("{base}/api/brands/{brand_id}"))
        .send()
        .await
        .expect("Failed to delete brand");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin
        .delete(format!("{base}/api/brands/{brand_id}"))
        .send()
        .await
        .expect("Failed to delete brand");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_color_hex_is_normalized() {
    let admin = admin_client().await;
    let base = admin_url();

    let resp = admin
        .post(format!("{base}/api/colors"))
        .json(&json!({"name": "Bad", "hex": "blue"}))
        .send()
        .await
        .expect("Failed to create color");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let color: Value = admin
        .post(format!("{base}/api/colors"))
        .json(&json!({"name": "Seafoam", "hex": "#9fe2bf"}))
        .send()
        .await
        .expect("Failed to create color")
        .json()
        .await
        .expect("Failed to parse color");
    assert_eq!(color["hex"], "#9FE2BF");

    admin
        .delete(format!("{base}/api/colors/{}", id_of(&color)))
        .send()
        .await
        .expect("Failed to delete color");
}

// ============================================================================
// Products & Media
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_product_update_keeps_omitted_relations() {
    let admin = admin_client().await;
    let base = admin_url();
    let product = create_product(&admin, sized_product(9)).await;
    let product_id = id_of(&product);

    let mut body = sized_product(3);
    body["title"] = json!("Renamed Tee");
    body["slug"] = product["slug"].clone();
    body.as_object_mut().expect("object").remove("sizes");

    let resp = admin
        .put(format!("{base}/api/products/{product_id}"))
        .json(&body)
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);

    let detail: Value = admin
        .get(format!("{base}/api/products/{product_id}"))
        .send()
        .await
        .expect("Failed to get product")
        .json()
        .await
        .expect("Failed to parse product");
    assert_eq!(detail["title"], "Renamed Tee");
    assert_eq!(detail["size_stock"], json!({"S": 3, "M": 3, "L": 3}));
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_product_validation() {
    let admin = admin_client().await;
    let base = admin_url();

    let mut negative = sized_product(1);
    negative["stock"] = json!(-1);
    let mut bad_attributes = sized_product(1);
    bad_attributes["attributes"] = json!({"sizeStock": [1, 2]});
    let mut missing_brand = sized_product(1);
    missing_brand["brand_id"] = json!(2_147_483_000);

    for (body, expected) in [
        (negative, StatusCode::BAD_REQUEST),
        (bad_attributes, StatusCode::BAD_REQUEST),
        (missing_brand, StatusCode::CONFLICT),
    ] {
        let resp = admin
            .post(format!("{base}/api/products"))
            .json(&body)
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), expected, "{body}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_media_upload_reorder_delete() {
    let admin = admin_client().await;
    let base = admin_url();
    let product_id = id_of(&create_product(&admin, sized_product(2)).await);

    let unsupported = upload(&admin, product_id, "application/pdf").await;
    assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let first: Value = upload(&admin, product_id, "image/png")
        .await
        .json()
        .await
        .expect("Failed to parse media");
    let second: Value = upload(&admin, product_id, "image/png")
        .await
        .json()
        .await
        .expect("Failed to parse media");
    assert_eq!(first["position"], 0);
    assert_eq!(second["position"], 1);

    let served = client()
        .get(first["url"].as_str().expect("url"))
        .send()
        .await
        .expect("Failed to fetch media");
    assert_eq!(served.status(), StatusCode::OK);

    let incomplete = admin
        .put(format!("{base}/api/products/{product_id}/media/order"))
        .json(&json!({"ids": [id_of(&second)]}))
        .send()
        .await
        .expect("Failed to reorder");
    assert_eq!(incomplete.status(), StatusCode::BAD_REQUEST);

    let reordered = admin
        .put(format!("{base}/api/products/{product_id}/media/order"))
        .json(&json!({"ids": [id_of(&second), id_of(&first)]}))
        .send()
        .await
        .expect("Failed to reorder");
    assert!(reordered.status().is_success());

    let resp = admin
        .delete(format!("{base}/api/media/{}", id_of(&first)))
        .send()
        .await
        .expect("Failed to delete media");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin
        .delete(format!("{base}/api/products/{product_id}"))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Shipping, Users & Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_shipping_settings_drive_estimate() {
    let admin = admin_client().await;
    let base = admin_url();
    let product_id = id_of(&create_product(&admin, sized_product(1)).await);

    let negative = admin
        .put(format!("{base}/api/shipping"))
        .json(&json!({
            "processingDaysMin": -1, "processingDaysMax": 0,
            "transitDaysMin": 0, "transitDaysMax": 0, "weekendDelivery": true
        }))
        .send()
        .await
        .expect("Failed to update shipping");
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let same_day = json!({
        "processingDaysMin": 0, "processingDaysMax": 0,
        "transitDaysMin": 0, "transitDaysMax": 0, "weekendDelivery": true
    });
    let saved: Value = admin
        .put(format!("{base}/api/shipping"))
        .json(&same_day)
        .send()
        .await
        .expect("Failed to update shipping")
        .json()
        .await
        .expect("Failed to parse settings");
    assert_eq!(saved, same_day);

    let range: Value = client()
        .get(format!(
            "{}/api/products/{product_id}/delivery-estimate",
            storefront_url()
        ))
        .send()
        .await
        .expect("Failed to get estimate")
        .json()
        .await
        .expect("Failed to parse estimate");
    assert_eq!(range["start"], range["end"]);

    admin
        .put(format!("{base}/api/shipping"))
        .json(&json!({
            "processingDaysMin": 1, "processingDaysMax": 2,
            "transitDaysMin": 2, "transitDaysMax": 5, "weekendDelivery": false
        }))
        .send()
        .await
        .expect("Failed to restore shipping");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_cannot_demote_or_delete_self() {
    let admin = admin_client().await;
    let base = admin_url();
    let me: Value = admin
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get me")
        .json()
        .await
        .expect("Failed to parse me");
    let my_id = id_of(&me);

    let demote = admin
        .patch(format!("{base}/api/users/{my_id}"))
        .json(&json!({"role": "customer"}))
        .send()
        .await
        .expect("Failed to update user");
    assert_eq!(demote.status(), StatusCode::CONFLICT);

    let delete = admin
        .delete(format!("{base}/api/users/{my_id}"))
        .send()
        .await
        .expect("Failed to delete user");
    assert_eq!(delete.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers"]
async fn test_order_status_transitions() {
    let admin = admin_client().await;
    let product = create_product(&admin, sized_product(4)).await;

    let shopper = client();
    signed_in_customer(&shopper).await;
    let storefront = storefront_url();
    shopper
        .post(format!("{storefront}/api/cart"))
        .json(&json!({"product_id": id_of(&product), "size": "S"}))
        .send()
        .await
        .expect("Failed to add to cart");
    let order: Value = shopper
        .post(format!("{storefront}/api/checkout"))
        .json(&json!({"shipping": {
            "name": "Test", "line1": "1 Quay St", "city": "Lisbon",
            "postal_code": "1100-001", "country": "PT"
        }}))
        .send()
        .await
        .expect("Failed to check out")
        .json()
        .await
        .expect("Failed to parse order");
    let order_id = id_of(&order);
    let base = admin_url();

    let skip = admin
        .patch(format!("{base}/api/orders/{order_id}"))
        .json(&json!({"status": "shipped"}))
        .send()
        .await
        .expect("Failed to update order");
    assert_eq!(skip.status(), StatusCode::CONFLICT);

    for status in ["paid", "shipped", "delivered"] {
        let updated: Value = admin
            .patch(format!("{base}/api/orders/{order_id}"))
            .json(&json!({"status": status}))
            .send()
            .await
            .expect("Failed to update order")
            .json()
            .await
            .expect("Failed to parse order");
        assert_eq!(updated["status"], status);
    }

    let listed: Value = admin
        .get(format!("{base}/api/orders?status=delivered"))
        .send()
        .await
        .expect("Failed to list orders")
        .json()
        .await
        .expect("Failed to parse orders");
    assert!(
        listed["items"]
            .as_array()
            .expect("items")
            .iter()
            .all(|o| o["status"] == "delivered")
    );
}
