//! Storefront cart state and checkout reconciliation.
//!
//! This crate holds the client-side logic of the storefront:
//!
//! - **Catalog**: the product type served by the listing API
//! - **Cart**: the cart value and the [`CartStore`] that owns and publishes it
//! - **Checkout**: order wire types and the [`CheckoutReconciler`]
//! - **Search**: listing queries, pages, and debounced [`ProductSearch`]
//! - **Gateway**: the backend seams the HTTP client implements
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_commerce::prelude::*;
//!
//! let store = CartStore::new();
//! let _badge = store.subscribe(|cart| println!("Cart ({})", cart.item_count()));
//!
//! store.add_item(Product::new(1, "Keyboard", Money::new(2550), 3), 1);
//!
//! let reconciler = CheckoutReconciler::new(store.clone(), client);
//! match reconciler.checkout().await {
//!     CheckoutOutcome::Succeeded(order) => println!("Order #{:?}", order.id),
//!     other => println!("{:?}", other.message()),
//! }
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod gateway;
pub mod search;

pub use cart::{Cart, CartItem, CartStore, Subscription};
pub use checkout::{CheckoutOutcome, CheckoutReconciler};
pub use error::ApiError;
pub use ids::*;
pub use money::Money;
pub use search::ProductSearch;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::ApiError;
    pub use crate::ids::*;
    pub use crate::money::Money;

    // Catalog
    pub use crate::catalog::Product;

    // Cart
    pub use crate::cart::{Cart, CartItem, CartStore, Subscription};

    // Checkout
    pub use crate::checkout::{
        CheckoutOutcome, CheckoutReconciler, CheckoutState, OrderItemRequest, OrderItemResponse,
        OrderRequest, OrderResponse, StockConflict, StockError,
    };

    // Search
    pub use crate::search::{
        Page, ProductPage, ProductQuery, ProductSearch, SearchConfig, SearchState,
    };

    // Gateway
    pub use crate::gateway::{OrderSubmitter, ProductCatalog};
}
