//! Product type as served by the catalog API.

use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A product in the catalog.
///
/// Products are owned by the backend; the client only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Unit price.
    pub price: Money,
    /// Quantity in stock at the time the product was fetched.
    pub stock: u32,
    /// Whether the product is active in the catalog.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Create an active product.
    pub fn new(id: i64, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            price,
            stock,
            active: true,
        }
    }

    /// Check if out of stock.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Whether the product may be added to a cart.
    ///
    /// This is caller policy; the cart store itself accepts any product.
    pub fn is_purchasable(&self) -> bool {
        self.active && !self.is_out_of_stock()
    }
}
