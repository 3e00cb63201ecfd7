//! Aggregates module
pub mod product;
pub mod discount;
pub mod cart;

pub use product::{Product, ProductColumn, ProductError, ProductFields, StockLevel};
pub use discount::{DiscountCode, DiscountPatch};
pub use cart::{Cart, CartItem, CartQuote};
