use serde::{Deserialize, Serialize};

use stockline_catalog::Product;
use stockline_orders::Order;
use stockline_users::User;

/// Immutable point-in-time copy of everything a dashboard aggregates.
///
/// Orders keep ledger insertion order; ranking tie-breaks depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    pub users: Vec<User>,
}

impl DashboardSnapshot {
    pub fn new(orders: Vec<Order>, products: Vec<Product>, users: Vec<User>) -> Self {
        Self {
            orders,
            products,
            users,
        }
    }
}
