//! Flat-file record stores.
//!
//! Every mutation is a whole-file read-modify-write cycle. Each store serializes its own
//! cycles behind a mutex; separate processes writing the same file still race.

pub mod csv_table;
pub mod discounts;
pub mod products;

pub use csv_table::CsvTable;
pub use discounts::{DiscountBook, DEFAULT_CODES};
pub use products::{ProductCatalog, Purchase, QuantityChange, StockUpdate};
