//! Product listing and order endpoints.

use std::time::Duration;

use async_trait::async_trait;
use storefront_commerce::checkout::{OrderRequest, OrderResponse, StockConflict};
use storefront_commerce::error::ApiError;
use storefront_commerce::gateway::{OrderSubmitter, ProductCatalog};
use storefront_commerce::ids::OrderId;
use storefront_commerce::search::{ProductPage, ProductQuery};
use tracing::{debug, instrument, warn};

use crate::{FetchClient, FetchError, Response};

/// Paginated product listing.
pub const PRODUCTS_PATH: &str = "/api/v1/products";

/// Order creation.
pub const ORDERS_PATH: &str = "/api/v1/orders";

/// Client for the storefront REST API.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    fetch: FetchClient,
}

impl StorefrontClient {
    /// Connect to the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let fetch = FetchClient::with_timeout(timeout)?
            .with_base_url(base_url)
            .with_default_header("Accept", "application/json");
        Ok(Self { fetch })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.fetch.base_url()
    }
}

#[async_trait]
impl ProductCatalog for StorefrontClient {
    #[instrument(skip(self), fields(search = ?query.search, page = query.page, size = query.size))]
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let response = self
            .fetch
            .get(PRODUCTS_PATH)
            .query(query.to_query_pairs())
            .send()
            .await?;

        decode_product_page(response)
    }
}

#[async_trait]
impl OrderSubmitter for StorefrontClient {
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, ApiError> {
        let response = self.fetch.post(ORDERS_PATH).json(request)?.send().await?;

        decode_order(response)
    }
}

/// Interpret a product listing response.
pub fn decode_product_page(response: Response) -> Result<ProductPage, ApiError> {
    let page: ProductPage = response.error_for_status()?.json()?;
    debug!(
        results = page.len(),
        total = page.total_elements,
        "products loaded"
    );
    Ok(page)
}

/// Interpret an order creation response.
///
/// A 409 becomes [`ApiError::StockConflict`]; a conflict body that is
/// missing, malformed or without `details` yields an empty shortfall list.
/// Any 2xx is a created order, even when its body cannot be decoded; the id
/// is kept if it can still be read.
pub fn decode_order(response: Response) -> Result<OrderResponse, ApiError> {
    if response.is_conflict() {
        let conflict = response.json::<StockConflict>().unwrap_or_else(|e| {
            warn!(error = %e, "unreadable conflict body");
            StockConflict::default()
        });
        return Err(ApiError::StockConflict(conflict));
    }

    let response = response.error_for_status()?;
    let order = response.json::<OrderResponse>().unwrap_or_else(|e| {
        let id = response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|body| body.get("id").and_then(serde_json::Value::as_i64))
            .map(OrderId::new);
        warn!(error = %e, order_id = ?id.map(|id| id.get()), "unreadable order body");
        OrderResponse::acknowledged(id)
    });
    debug!(order_id = ?order.id.map(|id| id.get()), "order accepted");
    Ok(order)
}
