use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockline_orders::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

/// Order count per status. Always five entries in lifecycle order; statuses
/// with no orders report zero.
pub fn status_distribution(orders: &[Order]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: orders.iter().filter(|o| o.status == status).count() as u64,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub users: u64,
}

/// Count users per country name, biggest first, then by name.
///
/// Takes already-resolved country names; callers drop users without one.
pub fn users_per_country<'a>(countries: impl IntoIterator<Item = &'a str>) -> Vec<CountryCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for country in countries {
        *counts.entry(country).or_default() += 1;
    }

    let mut rows: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, users)| CountryCount {
            country: country.to_string(),
            users,
        })
        .collect();
    rows.sort_by(|a, b| b.users.cmp(&a.users).then_with(|| a.country.cmp(&b.country)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockline_core::{Money, OrderId, ProductId, UserId};

    fn order(status: OrderStatus) -> Order {
        Order {
            order_id: OrderId::next(),
            user_id: UserId::from_raw("u"),
            product_id: ProductId::from_raw("p"),
            quantity: 1,
            total_amount: Money::from_minor(10),
            status,
            date: Utc::now(),
            delivery_date: None,
        }
    }

    #[test]
    fn distribution_zero_fills_missing_statuses() {
        let orders = vec![
            order(OrderStatus::Pending),
            order(OrderStatus::Pending),
            order(OrderStatus::Delivered),
        ];
        let dist = status_distribution(&orders);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist[0], StatusCount { status: OrderStatus::Pending, count: 2 });
        assert_eq!(dist[1].count, 0);
        assert_eq!(dist[3].count, 1);
        assert_eq!(dist.iter().map(|s| s.count).sum::<u64>(), 3);
    }

    #[test]
    fn empty_ledger_still_lists_every_status() {
        let dist = status_distribution(&[]);
        assert_eq!(dist.len(), 5);
        assert!(dist.iter().all(|s| s.count == 0));
    }

    #[test]
    fn countries_sort_by_count_then_name() {
        let rows = users_per_country(["Peru", "Chile", "Peru", "Austria", "Chile", "Peru"]);
        let flat: Vec<_> = rows.iter().map(|r| (r.country.as_str(), r.users)).collect();
        assert_eq!(flat, vec![("Peru", 3), ("Chile", 2), ("Austria", 1)]);
    }
}
