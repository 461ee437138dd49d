//! Search module.
//!
//! Contains the listing query, paginated results, and the debounced search
//! driver.

mod debounce;
mod query;
mod results;

pub use debounce::{ProductSearch, SearchConfig, SearchState, DEFAULT_QUIESCENCE};
pub use query::{ProductQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use results::{Page, ProductPage};
