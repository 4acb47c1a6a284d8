//! API integration tests for the product routes
//!
//! Coverage includes:
//! - Lookup by barcode (found, not found)
//! - Search pagination and the page past the end
//! - Parameter validation (400)
//! - Store failures (500, 503)
//! - CORS headers

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use foodfacts_server::{
    api::create_router,
    config::CorsConfig,
    features::FeatureState,
    ingest::{record::FieldValue, ProductRecord},
    store::ProductStore,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod helpers;

use helpers::{granola, seeded_store, BrokenStore};

// ============================================================================
// Helper Functions
// ============================================================================

fn wildcard_cors() -> CorsConfig {
    CorsConfig {
        allowed_origins: vec!["*".to_string()],
        allow_credentials: false,
    }
}

fn create_test_app(store: Arc<dyn ProductStore>) -> Router {
    create_router(FeatureState::new(store), &wildcard_cors())
}

async fn catalogue_app() -> Router {
    let mut records: Vec<ProductRecord> = (0..25).map(|i| granola(&format!("{i:03}"))).collect();
    records.push(
        ProductRecord::new("0000000000017")
            .with_field("product_name", FieldValue::Text("Vitória crackers".into()))
            .with_field("sugars_100g", FieldValue::Number(15.0)),
    );
    create_test_app(Arc::new(seeded_store(&records).await))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_get_product_by_barcode() {
    let app = catalogue_app().await;

    let (status, body) = get_json(&app, "/api/products/0000000000017").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "0000000000017");
    assert_eq!(body["product_name"], "Vitória crackers");
    assert_eq!(body["sugars_100g"], json!(15));
}

#[tokio::test]
async fn test_both_prefixes_serve_products() {
    let app = catalogue_app().await;

    let (api, api_body) = get_json(&app, "/api/products/001").await;
    let (bare, bare_body) = get_json(&app, "/products/001").await;
    assert_eq!(api, StatusCode::OK);
    assert_eq!(bare, StatusCode::OK);
    assert_eq!(api_body, bare_body);
}

#[tokio::test]
async fn test_get_unknown_product() {
    let app = catalogue_app().await;

    let (status, body) = get_json(&app, "/api/products/17").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Product not found" }));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_defaults() {
    let app = catalogue_app().await;

    let (status, body) = get_json(&app, "/api/products/search?query=granola").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["total"], 25);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["products"].as_array().unwrap().len(), 10);
    assert_eq!(body["products"][0]["code"], "000");
    assert!(body["products"][0]["score"].is_number());
}

#[tokio::test]
async fn test_search_last_and_beyond_last_page() {
    let app = catalogue_app().await;

    let (_, last) = get_json(&app, "/products/search?query=granola&page=3&pageSize=10").await;
    assert_eq!(last["products"].as_array().unwrap().len(), 5);
    assert_eq!(last["products"][0]["code"], "020");

    let (status, beyond) =
        get_json(&app, "/products/search?query=granola&page=9&pageSize=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beyond["products"], json!([]));
    assert_eq!(beyond["total"], 25);
    assert_eq!(beyond["totalPages"], 3);
}

#[tokio::test]
async fn test_search_accepts_large_page_size() {
    let app = catalogue_app().await;

    let (status, body) = get_json(&app, "/api/products/search?query=granola&pageSize=200").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageSize"], 200);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["products"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_search_without_matches() {
    let app = catalogue_app().await;

    let (status, body) = get_json(&app, "/api/products/search?query=caviar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["totalPages"], 0);
}

#[tokio::test]
async fn test_search_rejects_bad_parameters() {
    let app = catalogue_app().await;

    for uri in [
        "/api/products/search",
        "/api/products/search?query=%20",
        "/api/products/search?query=granola&page=0",
        "/api/products/search?query=granola&pageSize=0",
        "/api/products/search?query=granola&page=abc",
    ] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

// ============================================================================
// Store Failures
// ============================================================================

#[tokio::test]
async fn test_store_errors_are_server_errors() {
    let app = create_test_app(Arc::new(BrokenStore));

    for uri in ["/api/products/search?query=granola", "/api/products/001"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body["message"], "Server error");
        assert!(body["error"].as_str().unwrap().contains("database is down"));
    }
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(&catalogue_app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = get_json(&create_test_app(Arc::new(BrokenStore)), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = catalogue_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products/001")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_specific_origin_with_credentials() {
    let cors = CorsConfig {
        allowed_origins: vec!["http://shop.test".to_string()],
        allow_credentials: true,
    };
    let store = seeded_store(&[granola("001")]).await;
    let app = create_router(FeatureState::new(Arc::new(store)), &cors);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products/001")
                .header(header::ORIGIN, "http://shop.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "http://shop.test");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
}
