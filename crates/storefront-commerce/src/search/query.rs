//! Product listing query builder.

use serde::{Deserialize, Serialize};

/// Default page length used by the storefront.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page length a query will ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A product listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Trimmed search term; `None` when blank.
    pub search: Option<String>,
    /// Current page (0-indexed).
    pub page: u32,
    /// Items per page.
    pub size: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductQuery {
    /// First page, default size, no search term.
    pub fn new() -> Self {
        Self {
            search: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the search term. Surrounding whitespace is dropped and a blank
    /// term clears the search.
    pub fn with_search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self
    }

    /// Set pagination.
    pub fn with_pagination(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Query-string pairs in wire order. `search` is omitted when absent.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(ref search) = self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}
