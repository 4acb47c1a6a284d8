//! Feature modules implementing the product API
//!
//! Each feature is a vertical slice:
//! - `queries/` - Read operations, one `handle` per query
//! - `routes.rs` - HTTP route definitions and error mapping

pub mod products;

use std::sync::Arc;

use axum::Router;

use crate::store::ProductStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub store: Arc<dyn ProductStore>,
}

impl FeatureState {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }
}

/// Feature routes, to be nested under a path prefix such as `/products`.
pub fn product_router(state: FeatureState) -> Router {
    products::products_routes().with_state(state)
}
