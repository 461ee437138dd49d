//! Cart store: the single writer of cart state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use tracing::debug;

use crate::cart::Cart;
use crate::catalog::Product;
use crate::ids::ProductId;

type Subscriber = Arc<dyn Fn(&Cart) + Send + Sync>;

#[derive(Default)]
struct Shared {
    /// Held across mutate-and-notify so subscribers see states in call order.
    publish: Mutex<()>,
    /// Thread currently holding `publish`.
    publisher: Mutex<Option<ThreadId>>,
    cart: Mutex<Cart>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_id: AtomicU64,
}

impl Shared {
    /// Take the publish lock.
    ///
    /// Panics when called again from the thread already publishing, which
    /// only happens when a subscriber calls back into a mutating method.
    fn begin_publish(&self) -> Publishing<'_> {
        let me = thread::current().id();
        assert!(
            *lock(&self.publisher) != Some(me),
            "CartStore was mutated or subscribed to from inside one of its subscribers"
        );

        let guard = lock(&self.publish);
        *lock(&self.publisher) = Some(me);
        Publishing {
            _lock: guard,
            owner: &self.publisher,
        }
    }
}

struct Publishing<'a> {
    _lock: MutexGuard<'a, ()>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for Publishing<'_> {
    fn drop(&mut self) {
        *lock(self.owner) = None;
    }
}

/// Authoritative in-memory cart with synchronous change notification.
///
/// Cloning the store yields another handle to the same cart. Every mutation
/// recomputes the total and then invokes all subscribers, in registration
/// order, with the new state before returning. No mutation is ever skipped
/// or coalesced.
///
/// Subscribers may read the store (`snapshot`, `item_count`) but must not
/// mutate it or subscribe from inside a callback; doing so panics.
#[derive(Clone, Default)]
pub struct CartStore {
    shared: Arc<Shared>,
}

impl CartStore {
    /// Create a store holding an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line for the same product has its quantity incremented;
    /// otherwise a new line is appended. Stock is not checked here.
    pub fn add_item(&self, product: Product, quantity: u32) {
        let product_id = product.id;
        self.mutate("add_item", Some(product_id), |cart| cart.add_item(product, quantity));
    }

    /// Remove the line for a product. Absent products are ignored.
    pub fn remove_item(&self, product_id: ProductId) {
        self.mutate("remove_item", Some(product_id), |cart| {
            cart.remove_item(product_id);
        });
    }

    /// Set a line's quantity; a quantity <= 0 removes the line.
    ///
    /// Absent products are ignored.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        self.mutate("set_quantity", Some(product_id), |cart| {
            cart.set_quantity(product_id, quantity);
        });
    }

    /// Raise a line's quantity by one.
    pub fn increment(&self, product_id: ProductId) {
        self.step_quantity("increment", product_id, 1);
    }

    /// Lower a line's quantity by one, removing it at zero.
    pub fn decrement(&self, product_id: ProductId) {
        self.step_quantity("decrement", product_id, -1);
    }

    /// Reset to an empty cart.
    pub fn clear(&self) {
        self.mutate("clear", None, Cart::clear);
    }

    /// Current cart value.
    ///
    /// The returned cart is an independent copy; changing it never affects
    /// the store.
    pub fn snapshot(&self) -> Cart {
        lock(&self.shared.cart).clone()
    }

    /// Sum of quantities across all lines.
    pub fn item_count(&self) -> u64 {
        lock(&self.shared.cart).item_count()
    }

    /// Register a callback for cart changes.
    ///
    /// The callback runs once immediately with the current cart, then after
    /// every mutation. It stays registered until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Cart) + Send + Sync + 'static,
    {
        let _publish = self.shared.begin_publish();

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber: Subscriber = Arc::new(callback);
        lock(&self.shared.subscribers).push((id, Arc::clone(&subscriber)));
        debug!(subscription = id, "cart subscriber registered");

        let current = self.snapshot();
        subscriber(&current);

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    fn step_quantity(&self, op: &'static str, product_id: ProductId, delta: i64) {
        self.mutate(op, Some(product_id), |cart| {
            if let Some(item) = cart.get_item(product_id) {
                let quantity = i64::from(item.quantity) + delta;
                cart.set_quantity(product_id, quantity);
            }
        });
    }

    fn mutate<F>(&self, op: &'static str, product_id: Option<ProductId>, apply: F)
    where
        F: FnOnce(&mut Cart),
    {
        let _publish = self.shared.begin_publish();

        let updated = {
            let mut cart = lock(&self.shared.cart);
            apply(&mut cart);
            cart.clone()
        };

        debug!(
            op,
            product_id = product_id.map(|id| id.get()),
            lines = updated.unique_item_count(),
            total = %updated.total(),
            "cart updated"
        );

        self.notify(&updated);
    }

    fn notify(&self, cart: &Cart) {
        // Copy the list so callbacks run without the registry locked.
        let subscribers: Vec<Subscriber> = lock(&self.shared.subscribers)
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();

        for subscriber in subscribers {
            subscriber(cart);
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.snapshot())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle for a cart subscription.
///
/// Dropping the handle cancels the subscription.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Cancel the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the subscription alive for the lifetime of the store.
    pub fn detach(mut self) {
        self.shared = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.subscribers).retain(|(id, _)| *id != self.id);
            debug!(subscription = self.id, "cart subscriber removed");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
