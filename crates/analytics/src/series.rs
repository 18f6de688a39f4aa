//! Per-day time series.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockline_core::Money;
use stockline_orders::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub orders: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Money,
}

/// Number of orders per calendar day (UTC) of `date`, oldest day first.
///
/// Every status counts, Cancelled included.
pub fn orders_per_day(orders: &[Order]) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for order in orders {
        *days.entry(order.date.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, orders)| DailyCount { date, orders })
        .collect()
}

/// Sum of `total_amount` per calendar day (UTC), oldest day first.
pub fn revenue_per_day(orders: &[Order]) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for order in orders {
        let slot = days.entry(order.date.date_naive()).or_default();
        *slot = slot.saturating_add(order.total_amount);
    }
    days.into_iter()
        .map(|(date, revenue)| DailyRevenue { date, revenue })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stockline_core::{OrderId, ProductId, UserId};
    use stockline_orders::OrderStatus;

    fn order(day: u32, hour: u32, amount: u64) -> Order {
        Order {
            order_id: OrderId::next(),
            user_id: UserId::from_raw("u"),
            product_id: ProductId::from_raw("p"),
            quantity: 1,
            total_amount: Money::from_minor(amount),
            status: OrderStatus::Pending,
            date: Utc.with_ymd_and_hms(2024, 7, day, hour, 0, 0).unwrap(),
            delivery_date: None,
        }
    }

    #[test]
    fn groups_by_calendar_day_in_ascending_order() {
        let orders = vec![order(3, 23, 100), order(1, 0, 50), order(3, 1, 25)];

        let counts = orders_per_day(&orders);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(counts[0].orders, 1);
        assert_eq!(counts[1].orders, 2);

        let revenue = revenue_per_day(&orders);
        assert_eq!(revenue[0].revenue, Money::from_minor(50));
        assert_eq!(revenue[1].revenue, Money::from_minor(125));
    }

    #[test]
    fn empty_history_yields_empty_series() {
        assert!(orders_per_day(&[]).is_empty());
        assert!(revenue_per_day(&[]).is_empty());
    }
}
