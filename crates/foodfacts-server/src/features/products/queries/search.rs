use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{ProductStore, StoreError};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchProductsQuery {
    pub query: Option<String>,
    pub page: Option<u64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProductsResponse {
    /// Matching documents, each with its `score`
    pub products: Vec<Value>,
    pub page: u64,
    #[serde(rename = "pageSize")]
    pub page_size: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    pub total: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchProductsError {
    #[error("Query parameter `query` is required")]
    QueryRequired,
    #[error("Page must be at least 1")]
    InvalidPage,
    #[error("Page size must be at least 1")]
    InvalidPageSize,
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl SearchProductsQuery {
    pub fn validate(&self) -> Result<(), SearchProductsError> {
        if self.query.as_deref().map_or(true, |q| q.trim().is_empty()) {
            return Err(SearchProductsError::QueryRequired);
        }

        if self.page() < 1 {
            return Err(SearchProductsError::InvalidPage);
        }

        if self.page_size() < 1 {
            return Err(SearchProductsError::InvalidPageSize);
        }

        Ok(())
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn skip(&self) -> u64 {
        self.page().saturating_sub(1).saturating_mul(self.page_size())
    }
}

pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn ProductStore,
    query: SearchProductsQuery,
) -> Result<SearchProductsResponse, SearchProductsError> {
    query.validate()?;

    let page = query.page();
    let page_size = query.page_size();
    let text = query.query.as_deref().unwrap_or_default().trim();

    let results = store.search(text, query.skip(), page_size).await?;

    Ok(SearchProductsResponse {
        products: results.items.into_iter().map(|item| item.into_json()).collect(),
        page,
        page_size,
        total_pages: total_pages(results.total, page_size),
        total: results.total,
    })
}
