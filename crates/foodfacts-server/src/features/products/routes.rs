//! Product API routes
//!
//! - `GET /products/search?query=&page=&pageSize=` - Full-text search
//! - `GET /products/:barcode` - A single product by barcode
//!
//! Errors are JSON objects with a `message` and, for 400 and 500, an
//! `error` detail.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::queries::{
    GetProductError, GetProductQuery, SearchProductsError, SearchProductsQuery,
};
use crate::features::FeatureState;

// ============================================================================
// Router Configuration
// ============================================================================

pub fn products_routes() -> Router<FeatureState> {
    Router::new()
        .route("/search", get(search_products))
        .route("/:barcode", get(get_product))
}

// ============================================================================
// Query Handlers
// ============================================================================

/// Search products by name, brand and ingredients
///
/// # Response
///
/// - `200 OK` - `{ products, page, pageSize, totalPages, total }`
/// - `400 Bad Request` - Missing query or out-of-range paging
/// - `500 Internal Server Error` - Store failure
#[tracing::instrument(skip(state, query))]
async fn search_products(
    State(state): State<FeatureState>,
    query: Result<Query<SearchProductsQuery>, QueryRejection>,
) -> Result<Response, ProductApiError> {
    let Query(query) = query.map_err(ProductApiError::InvalidParams)?;
    let response = super::queries::search::handle(state.store.as_ref(), query).await?;

    tracing::debug!(
        total = response.total,
        returned = response.products.len(),
        "Product search via API"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Fetch one product by its barcode
///
/// # Response
///
/// - `200 OK` - The stored product document
/// - `404 Not Found` - `{ "message": "Product not found" }`
/// - `500 Internal Server Error` - Store failure
#[tracing::instrument(skip(state))]
async fn get_product(
    State(state): State<FeatureState>,
    Path(barcode): Path<String>,
) -> Result<Response, ProductApiError> {
    let query = GetProductQuery { code: barcode };
    let product = super::queries::get::handle(state.store.as_ref(), query).await?;

    Ok((StatusCode::OK, Json(product)).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum ProductApiError {
    InvalidParams(QueryRejection),
    GetError(GetProductError),
    SearchError(SearchProductsError),
}

impl From<GetProductError> for ProductApiError {
    fn from(err: GetProductError) -> Self {
        Self::GetError(err)
    }
}

impl From<SearchProductsError> for ProductApiError {
    fn from(err: SearchProductsError) -> Self {
        Self::SearchError(err)
    }
}

fn bad_request(error: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Invalid request parameters", "error": error })),
    )
        .into_response()
}

fn server_error(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Server error", "error": error })),
    )
        .into_response()
}

impl IntoResponse for ProductApiError {
    fn into_response(self) -> Response {
        match self {
            ProductApiError::InvalidParams(rejection) => bad_request(rejection.body_text()),

            ProductApiError::GetError(GetProductError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Product not found" })),
            )
                .into_response(),
            ProductApiError::GetError(err @ GetProductError::CodeRequired) => {
                bad_request(err.to_string())
            },
            ProductApiError::GetError(GetProductError::Store(err)) => {
                tracing::error!(error = %err, "Store error during product lookup");
                server_error(err.to_string())
            },

            ProductApiError::SearchError(SearchProductsError::Store(err)) => {
                tracing::error!(error = %err, "Store error during product search");
                server_error(err.to_string())
            },
            ProductApiError::SearchError(err) => bad_request(err.to_string()),
        }
    }
}
