//! Orders domain module.
//!
//! Business rules for customer orders: creation from a catalog product, the
//! status lifecycle, and the composite filter used by every order listing.
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod lifecycle;
pub mod order;
pub mod query;

pub use lifecycle::TransitionPolicy;
pub use order::{NewOrder, Order, OrderPatch, OrderStatus};
pub use query::{OrderFilter, query_orders};
