//! Backend seams for product listing and order submission.
//!
//! The concrete HTTP implementation lives in `storefront-data`; tests plug in
//! in-memory doubles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::checkout::{OrderRequest, OrderResponse};
use crate::error::ApiError;
use crate::search::{ProductPage, ProductQuery};

/// Paginated, searchable product listing.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch one page of products.
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError>;
}

/// Order creation.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Create an order. Insufficient stock is reported as
    /// [`ApiError::StockConflict`].
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, ApiError>;
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        (**self).fetch_products(query).await
    }
}

#[async_trait]
impl<T: OrderSubmitter + ?Sized> OrderSubmitter for Arc<T> {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, ApiError> {
        (**self).submit_order(request).await
    }
}
