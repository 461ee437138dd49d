//! Debounced product search with last-response-wins semantics.
//!
//! Term changes go through a quiescence timer: each new term restarts it, and
//! only the term still current when it expires is sent, and only if it
//! differs from the last term sent. Every request (debounced or not) takes a
//! sequence number; a response is applied only if its number is still the
//! latest issued. In-flight requests are never aborted, just ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::catalog::Product;
use crate::gateway::ProductCatalog;
use crate::search::{ProductPage, ProductQuery, DEFAULT_PAGE_SIZE};

/// Default quiescence window.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(300);

/// Search tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Idle time after the last term change before a request is sent.
    pub quiescence: Duration,
    /// Page length for every request.
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quiescence: DEFAULT_QUIESCENCE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Observable search state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    /// Term of the most recently issued request.
    pub term: String,
    /// Latest applied page; `None` before the first response or after a
    /// failed request.
    pub page: Option<ProductPage>,
    /// Whether the latest issued request is still outstanding.
    pub loading: bool,
}

impl SearchState {
    /// Products of the current page.
    pub fn products(&self) -> &[Product] {
        self.page.as_ref().map(|p| p.content.as_slice()).unwrap_or(&[])
    }
}

struct Inner<C> {
    catalog: C,
    page_size: u32,
    issued: AtomicU64,
    state: watch::Sender<SearchState>,
}

impl<C: ProductCatalog + 'static> Inner<C> {
    /// Send a request now and apply its response if still current.
    fn issue(self: &Arc<Self>, term: String, page: u32) {
        let mut seq = 0;
        // Numbering under the state lock orders it against response application.
        self.state.send_modify(|state| {
            seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            state.term = term.clone();
            state.loading = true;
        });

        let query = ProductQuery::new()
            .with_search(&term)
            .with_pagination(page, self.page_size);
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.fetch(seq, query).await });
    }

    #[instrument(skip(self), fields(search = ?query.search, page = query.page))]
    async fn fetch(&self, seq: u64, query: ProductQuery) {
        let result = self.catalog.fetch_products(&query).await;

        self.state.send_if_modified(|state| {
            let latest = self.issued.load(Ordering::SeqCst);
            if seq != latest {
                debug!(seq, latest, "discarding stale search response");
                return false;
            }

            state.loading = false;
            match result {
                Ok(page) => {
                    debug!(results = page.len(), total = page.total_elements, "search applied");
                    state.page = Some(page);
                }
                Err(e) => {
                    error!(error = %e, "failed to load products");
                    state.page = None;
                }
            }
            true
        });
    }
}

/// Debounced, paginated product search.
///
/// Must be created inside a Tokio runtime. Dropping it stops the debounce
/// worker; requests already in flight still finish.
pub struct ProductSearch<C> {
    inner: Arc<Inner<C>>,
    input: mpsc::UnboundedSender<String>,
    worker: JoinHandle<()>,
}

impl<C: ProductCatalog + 'static> ProductSearch<C> {
    /// Start the debounce worker.
    pub fn spawn(catalog: C, config: SearchConfig) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        let inner = Arc::new(Inner {
            catalog,
            page_size: config.page_size,
            issued: AtomicU64::new(0),
            state,
        });

        let (input, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(debounce_terms(Arc::clone(&inner), rx, config.quiescence));

        Self {
            inner,
            input,
            worker,
        }
    }

    /// Record a term change. The request, if any, is sent later.
    pub fn set_term(&self, term: impl Into<String>) {
        if self.input.send(term.into()).is_err() {
            debug!("search worker has stopped; term ignored");
        }
    }

    /// Load the first page for the current term immediately.
    pub fn load(&self) {
        let term = self.inner.state.borrow().term.clone();
        self.inner.issue(term, 0);
    }

    /// Load `page` of the current result set immediately.
    ///
    /// Returns `false`, without sending anything, when no page has been
    /// loaded yet or `page` is outside it.
    pub fn go_to_page(&self, page: u32) -> bool {
        let term = {
            let state = self.inner.state.borrow();
            match state.page {
                Some(ref current) if current.contains_page(page) => state.term.clone(),
                _ => return false,
            }
        };
        self.inner.issue(term, page);
        true
    }

    /// Load the page after the current one.
    pub fn next_page(&self) -> bool {
        match self.current_page_number() {
            Some(n) => self.go_to_page(n.saturating_add(1)),
            None => false,
        }
    }

    /// Load the page before the current one.
    pub fn prev_page(&self) -> bool {
        match self.current_page_number() {
            Some(n) if n > 0 => self.go_to_page(n - 1),
            _ => false,
        }
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    fn current_page_number(&self) -> Option<u32> {
        self.inner.state.borrow().page.as_ref().map(|p| p.number)
    }
}

impl<C> Drop for ProductSearch<C> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn debounce_terms<C: ProductCatalog + 'static>(
    inner: Arc<Inner<C>>,
    mut terms: mpsc::UnboundedReceiver<String>,
    quiescence: Duration,
) {
    let mut last_issued: Option<String> = None;
    let mut pending: Option<String> = None;

    loop {
        let Some(term) = pending.take() else {
            match terms.recv().await {
                Some(term) => pending = Some(term),
                None => break,
            }
            continue;
        };

        tokio::select! {
            next = terms.recv() => match next {
                Some(newer) => pending = Some(newer),
                None => break,
            },
            _ = tokio::time::sleep(quiescence) => {
                if last_issued.as_deref() == Some(term.as_str()) {
                    debug!(term = %term, "search term unchanged; not re-issued");
                } else {
                    inner.issue(term.clone(), 0);
                    last_issued = Some(term);
                }
            }
        }
    }

    debug!("search worker stopped");
}
