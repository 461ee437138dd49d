//! Checkout reconciliation: submit the cart, fold the result back into it.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::cart::CartStore;
use crate::checkout::{OrderRequest, OrderResponse, StockConflict, StockError};
use crate::error::ApiError;
use crate::gateway::OrderSubmitter;
use crate::ids::OrderId;

/// Message for failures other than stock conflicts.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error processing order. Please try again.";

/// Whether a checkout is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutState {
    Idle,
    Processing,
}

/// Result of a checkout attempt.
///
/// Every attempt ends in exactly one of these; failures are never raised
/// past the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Nothing to submit; the backend was not contacted.
    EmptyCart,
    /// Another checkout was already in flight; this call did nothing.
    Busy,
    /// Order created and cart cleared.
    Succeeded(OrderResponse),
    /// Order rejected for insufficient stock; cart untouched.
    Conflict(StockConflict),
    /// Any other failure; cart untouched, safe to retry.
    Failed(ApiError),
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Succeeded(_))
    }

    /// Id of the created order.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            CheckoutOutcome::Succeeded(order) => order.id,
            _ => None,
        }
    }

    /// Per-product shortfalls of a conflict, empty otherwise.
    pub fn stock_errors(&self) -> &[StockError] {
        match self {
            CheckoutOutcome::Conflict(conflict) => &conflict.details,
            _ => &[],
        }
    }

    /// User-facing text for the outcome, if it warrants one.
    pub fn message(&self) -> Option<String> {
        match self {
            CheckoutOutcome::EmptyCart | CheckoutOutcome::Busy => None,
            CheckoutOutcome::Succeeded(order) => Some(match order.id {
                Some(id) => format!("Order #{} created successfully!", id),
                None => "Order created successfully!".to_string(),
            }),
            CheckoutOutcome::Conflict(conflict) => Some(conflict.message_or_default().to_string()),
            CheckoutOutcome::Failed(_) => Some(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}

/// Submits the current cart as an order and applies the outcome to it.
///
/// At most one checkout runs per reconciler; overlapping calls return
/// [`CheckoutOutcome::Busy`] instead of queueing.
pub struct CheckoutReconciler<S> {
    store: CartStore,
    submitter: S,
    processing: AtomicBool,
}

impl<S: OrderSubmitter> CheckoutReconciler<S> {
    pub fn new(store: CartStore, submitter: S) -> Self {
        Self {
            store,
            submitter,
            processing: AtomicBool::new(false),
        }
    }

    /// The store this reconciler reads from and clears.
    pub fn store(&self) -> &CartStore {
        &self.store
    }

    pub fn state(&self) -> CheckoutState {
        if self.is_processing() {
            CheckoutState::Processing
        } else {
            CheckoutState::Idle
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Submit the current cart.
    ///
    /// On success the cart is cleared. On a stock conflict or any other
    /// failure the cart is left exactly as it was.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> CheckoutOutcome {
        let cart = self.store.snapshot();
        if cart.is_empty() {
            debug!("checkout skipped: cart is empty");
            return CheckoutOutcome::EmptyCart;
        }

        let Some(_processing) = ProcessingGuard::acquire(&self.processing) else {
            warn!("checkout rejected: another checkout is in flight");
            return CheckoutOutcome::Busy;
        };

        let request = OrderRequest::from_cart(&cart);
        info!(
            lines = request.items.len(),
            total = %cart.total(),
            "submitting order"
        );

        match self.submitter.submit_order(&request).await {
            Ok(order) => {
                self.store.clear();
                info!(
                    order_id = ?order.id.map(|id| id.get()),
                    total = %order.total,
                    "order created"
                );
                CheckoutOutcome::Succeeded(order)
            }
            Err(ApiError::StockConflict(conflict)) => {
                warn!(
                    shortfalls = conflict.details.len(),
                    reason = conflict.message_or_default(),
                    "order rejected for insufficient stock"
                );
                CheckoutOutcome::Conflict(conflict)
            }
            Err(e) => {
                error!(error = %e, "order submission failed");
                CheckoutOutcome::Failed(e)
            }
        }
    }
}

/// Clears the processing flag when dropped, so every exit path (including a
/// dropped future) returns the reconciler to idle.
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::ids::ProductId;
    use crate::money::Money;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct FixedSubmitter {
        result: Result<OrderResponse, ApiError>,
        calls: AtomicUsize,
    }

    impl FixedSubmitter {
        fn new(result: Result<OrderResponse, ApiError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OrderSubmitter for FixedSubmitter {
        async fn submit_order(&self, _request: &OrderRequest) -> Result<OrderResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn order(id: i64) -> OrderResponse {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "createdAt": "2024-05-01T10:15:30",
            "total": 20.0,
            "items": []
        }))
        .unwrap()
    }

    fn filled_store() -> CartStore {
        let store = CartStore::new();
        store.add_item(Product::new(1, "A", Money::new(1000), 5), 2);
        store
    }

    #[tokio::test]
    async fn test_empty_cart_does_not_submit() {
        let submitter = Arc::new(FixedSubmitter::new(Ok(order(1))));
        let reconciler = CheckoutReconciler::new(CartStore::new(), Arc::clone(&submitter));

        assert_eq!(reconciler.checkout().await, CheckoutOutcome::EmptyCart);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_clears_cart() {
        let store = filled_store();
        let reconciler = CheckoutReconciler::new(store.clone(), FixedSubmitter::new(Ok(order(42))));

        let outcome = reconciler.checkout().await;

        assert_eq!(outcome.order_id(), Some(OrderId::new(42)));
        assert_eq!(outcome.message().unwrap(), "Order #42 created successfully!");
        assert!(store.snapshot().is_empty());
        assert_eq!(store.snapshot().total(), Money::zero());
        assert_eq!(reconciler.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_success_without_readable_id_clears_cart() {
        let store = filled_store();
        let reconciler = CheckoutReconciler::new(
            store.clone(),
            FixedSubmitter::new(Ok(OrderResponse::acknowledged(None))),
        );

        let outcome = reconciler.checkout().await;

        assert!(outcome.is_success());
        assert_eq!(outcome.order_id(), None);
        assert_eq!(outcome.message().unwrap(), "Order created successfully!");
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_keeps_cart() {
        let store = filled_store();
        let before = store.snapshot();
        let conflict = StockConflict::new(None, vec![StockError::new(ProductId::new(7), 1)]);
        let reconciler = CheckoutReconciler::new(
            store.clone(),
            FixedSubmitter::new(Err(ApiError::StockConflict(conflict.clone()))),
        );

        let outcome = reconciler.checkout().await;

        assert_eq!(outcome, CheckoutOutcome::Conflict(conflict));
        assert_eq!(outcome.stock_errors(), &[StockError::new(ProductId::new(7), 1)]);
        assert_eq!(outcome.message().unwrap(), "Insufficient stock");
        assert_eq!(store.snapshot(), before);
        assert!(!reconciler.is_processing());
    }

    #[tokio::test]
    async fn test_failure_keeps_cart_and_allows_retry() {
        let store = filled_store();
        let before = store.snapshot();
        let submitter = Arc::new(FixedSubmitter::new(Err(ApiError::Transport(
            "connection refused".to_string(),
        ))));
        let reconciler = CheckoutReconciler::new(store.clone(), Arc::clone(&submitter));

        let first = reconciler.checkout().await;
        assert!(matches!(first, CheckoutOutcome::Failed(ApiError::Transport(_))));
        assert_eq!(first.message().unwrap(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(store.snapshot(), before);

        let second = reconciler.checkout().await;
        assert!(matches!(second, CheckoutOutcome::Failed(_)));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_processing_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let guard = ProcessingGuard::acquire(&flag).unwrap();
        assert!(ProcessingGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(ProcessingGuard::acquire(&flag).is_some());
    }
}
