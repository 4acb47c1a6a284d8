use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{ProductStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProductQuery {
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetProductError {
    #[error("Product code is required")]
    CodeRequired,
    #[error("Product not found")]
    NotFound,
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl GetProductQuery {
    pub fn validate(&self) -> Result<(), GetProductError> {
        if self.code.trim().is_empty() {
            return Err(GetProductError::CodeRequired);
        }
        Ok(())
    }
}

/// Exact match on `code`.
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn ProductStore,
    query: GetProductQuery,
) -> Result<Value, GetProductError> {
    query.validate()?;

    store
        .find_by_code(&query.code)
        .await?
        .ok_or(GetProductError::NotFound)
}
