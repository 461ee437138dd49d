//! Checkout module.
//!
//! Contains the order wire types and the reconciler that turns a cart into
//! an order.

mod order;
mod reconciler;

pub use order::{
    OrderItemRequest, OrderItemResponse, OrderRequest, OrderResponse, StockConflict, StockError,
    DEFAULT_CONFLICT_MESSAGE,
};
pub use reconciler::{CheckoutOutcome, CheckoutReconciler, CheckoutState, GENERIC_FAILURE_MESSAGE};
