//! `stockline-analytics`
//!
//! **Responsibility:** dashboard aggregations over the full order history.
//!
//! Everything here is a pure function of a [`DashboardSnapshot`] fetched once
//! per view:
//! - it never performs IO or mutates domain state;
//! - pagination does not apply (aggregates always see every order).
//!
//! Side effects triggered by a view (country enrichment, low-stock alerts) live
//! in `stockline-infra`.

pub mod distribution;
pub mod ranking;
pub mod report;
pub mod series;
pub mod snapshot;

pub use distribution::{CountryCount, StatusCount, status_distribution, users_per_country};
pub use ranking::{
    LOW_STOCK_RANKING_SIZE, ProductRank, RankMetric, TOP_N, UNKNOWN_PRODUCT, low_stock_ranking,
    top_products,
};
pub use report::{AnalyticsReport, DashboardSummary};
pub use series::{DailyCount, DailyRevenue, orders_per_day, revenue_per_day};
pub use snapshot::DashboardSnapshot;
