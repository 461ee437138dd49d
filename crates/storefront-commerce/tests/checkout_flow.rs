//! End-to-end storefront flows against in-memory backends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use storefront_commerce::prelude::*;

/// In-memory backend that decrements stock on every accepted order.
struct InMemoryBackend {
    products: Mutex<Vec<Product>>,
    next_order: Mutex<i64>,
    submitted: Mutex<Vec<OrderRequest>>,
}

impl InMemoryBackend {
    fn new(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            next_order: Mutex::new(1),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn stock_of(&self, id: i64) -> u32 {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == ProductId::new(id))
            .map(|p| p.stock)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryBackend {
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let products = self.products.lock().unwrap();
        let matching: Vec<Product> = products
            .iter()
            .filter(|p| match query.search {
                Some(ref term) => p.name.to_lowercase().contains(&term.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();

        let size = query.size as usize;
        let total = matching.len();
        let total_pages = total.div_ceil(size) as u32;
        let content = matching
            .into_iter()
            .skip(query.page as usize * size)
            .take(size)
            .collect();

        Ok(Page {
            content,
            total_elements: total as u64,
            total_pages,
            size: query.size,
            number: query.page,
            first: query.page == 0,
            last: query.page + 1 >= total_pages,
        })
    }
}

#[async_trait]
impl OrderSubmitter for InMemoryBackend {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, ApiError> {
        self.submitted.lock().unwrap().push(request.clone());
        let mut products = self.products.lock().unwrap();

        let shortfalls: Vec<StockError> = request
            .items
            .iter()
            .filter_map(|item| {
                let product = products.iter().find(|p| p.id == item.product_id)?;
                (product.stock < item.quantity).then(|| StockError::new(product.id, product.stock))
            })
            .collect();
        if !shortfalls.is_empty() {
            return Err(ApiError::StockConflict(StockConflict::new(
                Some("Insufficient stock".to_string()),
                shortfalls,
            )));
        }

        let mut total = Money::zero();
        for item in &request.items {
            if let Some(product) = products.iter_mut().find(|p| p.id == item.product_id) {
                product.stock -= item.quantity;
                total = total + product.price * i64::from(item.quantity);
            }
        }

        let mut next = self.next_order.lock().unwrap();
        let id = *next;
        *next += 1;

        Ok(serde_json::from_value(serde_json::json!({
            "id": id,
            "createdAt": "2024-05-01T10:15:30",
            "total": total.to_decimal(),
            "items": []
        }))
        .unwrap())
    }
}

fn catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Keyboard", Money::new(2000), 5),
        Product::new(2, "Mouse", Money::new(550), 1),
        Product::new(3, "Monitor", Money::new(90000), 0),
    ]
}

#[tokio::test]
async fn test_cart_to_order_round() {
    let backend = Arc::new(InMemoryBackend::new(catalog()));
    let store = CartStore::new();
    let badge = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&badge);
    let _sub = store.subscribe(move |cart: &Cart| seen.lock().unwrap().push(cart.item_count()));

    let page = backend
        .fetch_products(&ProductQuery::new())
        .await
        .unwrap();
    for product in page.content.into_iter().filter(Product::is_purchasable) {
        store.add_item(product, 1);
    }
    store.increment(ProductId::new(1));

    let reconciler = CheckoutReconciler::new(store.clone(), Arc::clone(&backend));
    let outcome = reconciler.checkout().await;

    assert_eq!(outcome.order_id(), Some(OrderId::new(1)));
    assert!(store.snapshot().is_empty());
    assert_eq!(backend.stock_of(1), 3);
    assert_eq!(backend.stock_of(2), 0);
    assert_eq!(*badge.lock().unwrap(), vec![0, 1, 2, 3, 0]);

    let submitted = backend.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(
        submitted[0].items,
        vec![
            OrderItemRequest {
                product_id: ProductId::new(1),
                quantity: 2
            },
            OrderItemRequest {
                product_id: ProductId::new(2),
                quantity: 1
            },
        ]
    );
}

#[tokio::test]
async fn test_conflict_then_fix_and_retry() {
    let backend = Arc::new(InMemoryBackend::new(catalog()));
    let store = CartStore::new();
    store.add_item(Product::new(2, "Mouse", Money::new(550), 1), 3);

    let reconciler = CheckoutReconciler::new(store.clone(), Arc::clone(&backend));

    let outcome = reconciler.checkout().await;
    assert_eq!(
        outcome.stock_errors(),
        &[StockError::new(ProductId::new(2), 1)]
    );
    assert_eq!(store.snapshot().item_count(), 3);
    assert_eq!(backend.stock_of(2), 1);

    let available = outcome.stock_errors()[0].available;
    store.set_quantity(ProductId::new(2), i64::from(available));

    let retry = reconciler.checkout().await;
    assert!(retry.is_success());
    assert!(store.snapshot().is_empty());
    assert_eq!(backend.stock_of(2), 0);
}

#[tokio::test]
async fn test_concurrent_checkouts_submit_once() {
    struct SlowSubmitter(Arc<InMemoryBackend>);

    #[async_trait]
    impl OrderSubmitter for SlowSubmitter {
        async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, ApiError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.submit_order(request).await
        }
    }

    let backend = Arc::new(InMemoryBackend::new(catalog()));
    let store = CartStore::new();
    store.add_item(Product::new(1, "Keyboard", Money::new(2000), 5), 1);

    let reconciler = CheckoutReconciler::new(store.clone(), SlowSubmitter(Arc::clone(&backend)));
    let (a, b) = tokio::join!(reconciler.checkout(), reconciler.checkout());

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 1);
    assert!(outcomes.contains(&CheckoutOutcome::Busy));
    assert_eq!(backend.submitted.lock().unwrap().len(), 1);
    assert_eq!(reconciler.state(), CheckoutState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_search_then_add_from_results() {
    let backend = Arc::new(InMemoryBackend::new(catalog()));
    let search = ProductSearch::spawn(
        Arc::clone(&backend),
        SearchConfig {
            quiescence: Duration::from_millis(300),
            page_size: 2,
        },
    );

    search.load();
    tokio::time::sleep(Duration::from_millis(1)).await;
    let state = search.state();
    assert_eq!(state.products().len(), 2);
    assert_eq!(state.page.as_ref().unwrap().total_pages, 2);

    search.set_term("mo");
    tokio::time::sleep(Duration::from_millis(350)).await;

    let state = search.state();
    let names: Vec<&str> = state.products().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Mouse", "Monitor"]);
    assert!(!state.loading);

    let store = CartStore::new();
    for product in state.products().iter().filter(|p| p.is_purchasable()) {
        store.add_item(product.clone(), 1);
    }
    assert_eq!(store.item_count(), 1);
    assert_eq!(store.snapshot().total(), Money::new(550));
}
