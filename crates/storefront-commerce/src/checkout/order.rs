//! Order request/response types and stock errors.

use crate::cart::Cart;
use crate::ids::{OrderId, OrderLineId, ProductId};
use crate::money::Money;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Fallback shown when the backend rejects an order without a message.
pub const DEFAULT_CONFLICT_MESSAGE: &str = "Insufficient stock";

/// One line of an order submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of a create-order request.
///
/// Built from a cart snapshot; later cart changes do not affect it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderRequest {
    pub items: Vec<OrderItemRequest>,
}

impl OrderRequest {
    /// Build a request from a cart, preserving line order.
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| OrderItemRequest {
                    product_id: item.product.id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A line of a created order, priced by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: OrderLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at order time; may differ from the price the cart saw.
    pub unit_price: Money,
    pub line_total: Money,
}

/// A created order.
///
/// Every body field is optional; a 2xx status alone means the order exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default)]
    pub id: Option<OrderId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub total: Money,
    #[serde(default)]
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    /// An accepted order whose body could not be read beyond its id.
    pub fn acknowledged(id: Option<OrderId>) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Get total item count.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Parse a backend timestamp.
///
/// Accepts a local date-time (`2024-05-01T10:15:30.123`) or RFC 3339 with an
/// offset, which is normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

/// Shortfall for one product in a rejected order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockError {
    pub product_id: ProductId,
    pub available: u32,
}

impl StockError {
    pub fn new(product_id: ProductId, available: u32) -> Self {
        Self {
            product_id,
            available,
        }
    }
}

/// Body of a stock conflict response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StockConflict {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<StockError>,
}

impl StockConflict {
    pub fn new(message: Option<String>, details: Vec<StockError>) -> Self {
        Self { message, details }
    }

    /// Server message, or a generic one when the server sent none.
    pub fn message_or_default(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_CONFLICT_MESSAGE)
    }
}
