//! Catalog domain module.
//!
//! Business rules for products and their stock levels, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod search;

pub use product::{
    LOW_STOCK_THRESHOLD, NewProduct, Product, ProductPatch, is_low_stock,
};
pub use search::ProductFilter;
