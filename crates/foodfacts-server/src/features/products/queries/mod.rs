pub mod get;
pub mod search;

pub use get::{GetProductError, GetProductQuery};
pub use search::{SearchProductsError, SearchProductsQuery, SearchProductsResponse};
