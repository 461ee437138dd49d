//! Cart and line item types.

use crate::catalog::Product;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A shopping cart.
///
/// Items keep insertion order and hold at most one line per product. The
/// total is derived: every mutation refolds it from the items, so it can
/// never drift from `sum(price * quantity)`.
///
/// Mutators are crate-private; outside this crate a `Cart` is a value
/// obtained from [`CartStore::snapshot`](crate::cart::CartStore::snapshot).
/// A decoded cart ignores any serialized `total` and drops empty lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "CartLines")]
pub struct Cart {
    items: Vec<CartItem>,
    total: Money,
}

/// Wire shape of a cart; only the lines are trusted.
#[derive(Deserialize)]
struct CartLines {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl From<CartLines> for Cart {
    fn from(lines: CartLines) -> Self {
        let mut cart = Cart {
            items: lines.items,
            total: Money::zero(),
        };
        cart.items.retain(|i| i.quantity > 0);
        cart.refresh_total();
        cart
    }
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Cart total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Get number of distinct products.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the line for a product.
    pub fn get_item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product.id == product_id)
    }

    /// Recompute the total from scratch.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add `quantity` units of a product, merging into an existing line.
    ///
    /// A zero quantity leaves the cart untouched.
    pub(crate) fn add_item(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem { product, quantity });
        }
        self.refresh_total();
    }

    /// Remove the line for a product. Returns whether a line was removed.
    pub(crate) fn remove_item(&mut self, product_id: ProductId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| i.product.id != product_id);
        self.refresh_total();
        self.items.len() < len_before
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity <= 0 removes the line. Returns whether the cart changed.
    pub(crate) fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        let quantity = u32::try_from(quantity).unwrap_or_else(|_| {
            debug!(requested = quantity, clamped = u32::MAX, "quantity clamped");
            u32::MAX
        });
        let changed = match self.items.iter_mut().find(|i| i.product.id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        };
        self.refresh_total();
        changed
    }

    /// Drop every line.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.refresh_total();
    }

    fn refresh_total(&mut self) {
        self.total = self.computed_total();
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Product as it was when added.
    pub product: Product,
    /// Quantity, always positive.
    pub quantity: u32,
}

impl CartItem {
    /// Unit price times quantity.
    pub fn line_total(&self) -> Money {
        self.product.price.multiply(i64::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, cents: i64) -> Product {
        Product::new(id, format!("Product {}", id), Money::new(cents), 10)
    }

    #[test]
    fn test_cart_creation() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());
    }

    #[test]
    fn test_add_same_item_increases_quantity() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), 1);
        cart.add_item(product(1, 1000), 2);

        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), Money::new(3000));
    }

    #[test]
    fn test_add_zero_is_ignored() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_items_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add_item(product(3, 100), 1);
        cart.add_item(product(1, 100), 1);
        cart.add_item(product(3, 100), 1);

        let ids: Vec<i64> = cart.items().iter().map(|i| i.product.id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_set_quantity_non_positive_removes() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), 2);
        cart.add_item(product(2, 500), 2);

        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.set_quantity(ProductId::new(2), -1));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), 2);
        let before = cart.clone();

        assert!(!cart.set_quantity(ProductId::new(99), 5));
        assert!(!cart.remove_item(ProductId::new(99)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_total_matches_recomputation() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), 2);
        cart.add_item(product(2, 550), 1);
        assert_eq!(cart.total(), Money::new(2550));

        cart.set_quantity(ProductId::new(2), 4);
        assert_eq!(cart.total(), cart.computed_total());
        assert_eq!(cart.total(), Money::new(4200));

        cart.remove_item(ProductId::new(1));
        assert_eq!(cart.total(), Money::new(2200));
    }

    #[test]
    fn test_set_quantity_clamps_to_u32() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1), 1);

        assert!(cart.set_quantity(ProductId::new(1), i64::MAX));
        assert_eq!(cart.get_item(ProductId::new(1)).unwrap().quantity, u32::MAX);
        assert_eq!(cart.total(), cart.computed_total());
    }

    #[test]
    fn test_decoded_cart_recomputes_total() {
        let json = r#"{
            "items": [
                {"product": {"id": 1, "name": "A", "price": 10.0, "stock": 5, "active": true}, "quantity": 2},
                {"product": {"id": 2, "name": "B", "price": 1.0, "stock": 5, "active": true}, "quantity": 0}
            ],
            "total": 0.0
        }"#;

        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.total(), Money::new(2000));
        assert_eq!(cart.total(), cart.computed_total());
    }

    #[test]
    fn test_line_total() {
        let item = CartItem {
            product: product(1, 550),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Money::new(1650));
    }
}
