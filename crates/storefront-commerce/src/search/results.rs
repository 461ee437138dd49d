//! Paginated results as returned by the listing API.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// One page of results.
///
/// Mirrors the backend's page object; `number` is 0-indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The result items.
    pub content: Vec<T>,
    /// Total number of items across all pages.
    pub total_elements: u64,
    /// Total number of pages.
    pub total_pages: u32,
    /// Requested page length.
    pub size: u32,
    /// Page index (0-indexed).
    pub number: u32,
    /// Whether this is the first page.
    pub first: bool,
    /// Whether this is the last page.
    pub last: bool,
}

/// A page of products.
pub type ProductPage = Page<Product>;

impl<T> Page<T> {
    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Get number of items in this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether `page` is a valid index for this result set.
    pub fn contains_page(&self, page: u32) -> bool {
        page < self.total_pages
    }

    /// Whether there's a next page.
    pub fn has_next(&self) -> bool {
        !self.last && self.contains_page(self.number + 1)
    }

    /// Whether there's a previous page.
    pub fn has_prev(&self) -> bool {
        !self.first && self.number > 0
    }

    /// Whether pagination controls are worth showing.
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}
