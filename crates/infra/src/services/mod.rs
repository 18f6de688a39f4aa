//! Application services: orchestrate stores, the notifier and the lookup
//! around the pure domain crates. No HTTP specifics live here.

pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod placement;

pub use catalog::CatalogService;
pub use dashboard::{CountryFlag, Dashboard, DashboardService};
pub use orders::OrderService;
pub use placement::OrderPlacementService;
