//! Catalog module.
//!
//! Contains the product type served by the product listing API.

mod product;

pub use product::Product;
