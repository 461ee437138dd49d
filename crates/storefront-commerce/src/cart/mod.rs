//! Shopping cart module.
//!
//! Contains the cart value type and the store that owns and publishes it.

mod cart;
mod store;

pub use cart::{Cart, CartItem};
pub use store::{CartStore, Subscription};
