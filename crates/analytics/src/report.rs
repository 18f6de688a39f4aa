use serde::{Deserialize, Serialize};

use crate::distribution::{CountryCount, StatusCount, status_distribution, users_per_country};
use crate::ranking::{
    LOW_STOCK_RANKING_SIZE, ProductRank, RankMetric, TOP_N, low_stock_ranking, top_products,
};
use crate::series::{DailyCount, DailyRevenue, orders_per_day, revenue_per_day};
use crate::snapshot::DashboardSnapshot;

use stockline_catalog::Product;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: u64,
    pub total_products: u64,
    pub total_orders: u64,
}

/// Every dashboard aggregate, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub summary: DashboardSummary,
    pub orders_per_day: Vec<DailyCount>,
    pub revenue_per_day: Vec<DailyRevenue>,
    pub top_by_quantity: Vec<ProductRank>,
    pub top_by_revenue: Vec<ProductRank>,
    pub status_distribution: Vec<StatusCount>,
    pub countries: Vec<CountryCount>,
    pub low_stock: Vec<Product>,
}

impl AnalyticsReport {
    pub fn compute(snapshot: &DashboardSnapshot) -> Self {
        let orders = &snapshot.orders;
        let products = &snapshot.products;

        Self {
            summary: DashboardSummary {
                total_users: snapshot.users.len() as u64,
                total_products: products.len() as u64,
                total_orders: orders.len() as u64,
            },
            orders_per_day: orders_per_day(orders),
            revenue_per_day: revenue_per_day(orders),
            top_by_quantity: top_products(orders, products, RankMetric::Quantity, TOP_N),
            top_by_revenue: top_products(orders, products, RankMetric::Revenue, TOP_N),
            status_distribution: status_distribution(orders),
            countries: users_per_country(snapshot.users.iter().filter_map(|u| u.country())),
            low_stock: low_stock_ranking(products, LOW_STOCK_RANKING_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockline_core::{Money, OrderId, ProductId, UserId};
    use stockline_orders::{Order, OrderStatus};
    use stockline_users::{Address, User};

    fn user(id: &str, country: Option<&str>) -> User {
        User {
            id: UserId::from_raw(id),
            email: format!("{id}@example.com"),
            address: Address {
                country: country.map(str::to_string),
            },
        }
    }

    fn snapshot() -> DashboardSnapshot {
        let lamp = Product {
            id: ProductId::from_raw("p-1"),
            name: "Desk Lamp".to_string(),
            price: Money::from_minor(1000),
            stock: 4,
        };
        let chair = Product {
            id: ProductId::from_raw("p-2"),
            name: "Chair".to_string(),
            price: Money::from_minor(5000),
            stock: 80,
        };
        let order = |product: &str, qty: u32, status| Order {
            order_id: OrderId::next(),
            user_id: UserId::from_raw("u-1"),
            product_id: ProductId::from_raw(product),
            quantity: qty,
            total_amount: Money::from_minor(100),
            status,
            date: Utc::now(),
            delivery_date: None,
        };

        DashboardSnapshot::new(
            vec![
                order("p-1", 5, OrderStatus::Pending),
                order("p-1", 3, OrderStatus::Cancelled),
                order("p-2", 2, OrderStatus::Delivered),
            ],
            vec![chair, lamp],
            vec![user("u-1", Some("Peru")), user("u-2", None), user("u-3", Some(" "))],
        )
    }

    #[test]
    fn report_covers_every_aggregate() {
        let report = AnalyticsReport::compute(&snapshot());

        assert_eq!(
            report.summary,
            DashboardSummary {
                total_users: 3,
                total_products: 2,
                total_orders: 3
            }
        );
        assert_eq!(report.orders_per_day.iter().map(|d| d.orders).sum::<u64>(), 3);
        assert_eq!(report.top_by_quantity[0].name, "Desk Lamp");
        assert_eq!(report.top_by_quantity[0].value, 5);
        assert_eq!(report.status_distribution.len(), 5);
        assert_eq!(report.countries.len(), 1);
        assert_eq!(report.countries[0].country, "Peru");
        assert_eq!(report.low_stock[0].name, "Desk Lamp");
    }

    #[test]
    fn empty_snapshot_produces_empty_aggregates() {
        let report = AnalyticsReport::compute(&DashboardSnapshot::default());
        assert_eq!(report.summary, DashboardSummary::default());
        assert!(report.top_by_quantity.is_empty());
        assert!(report.orders_per_day.is_empty());
        assert!(report.status_distribution.iter().all(|s| s.count == 0));
    }
}
