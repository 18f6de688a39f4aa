use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use stockline_core::{Entity, OrderId, Page, PageRequest};
use stockline_orders::{Order, OrderFilter, OrderPatch, OrderStatus, TransitionPolicy, query_orders};

use super::StoreError;

/// Order ledger boundary.
///
/// Orders are kept in insertion order; every listing preserves it.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Fails with `Conflict` if `order_id` is already present.
    async fn create_order(&self, order: Order) -> Result<Order, StoreError>;

    async fn get_order(&self, id: &OrderId) -> Result<Order, StoreError>;

    /// Every order, unpaged. Used by the dashboard.
    async fn list_orders_full(&self) -> Result<Vec<Order>, StoreError>;

    /// Filter then page; `total_matching` counts the whole filtered set.
    async fn query_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError>;

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    /// Apply `patch` under `policy`. Returns the order as written.
    async fn update_order(
        &self,
        id: &OrderId,
        patch: &OrderPatch,
        policy: TransitionPolicy,
    ) -> Result<Order, StoreError>;
}

#[async_trait]
impl<S> OrderLedger for Arc<S>
where
    S: OrderLedger + ?Sized,
{
    async fn create_order(&self, order: Order) -> Result<Order, StoreError> {
        (**self).create_order(order).await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, StoreError> {
        (**self).get_order(id).await
    }

    async fn list_orders_full(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders_full().await
    }

    async fn query_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        (**self).query_orders(filter, page).await
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        (**self).list_by_status(status).await
    }

    async fn update_order(
        &self,
        id: &OrderId,
        patch: &OrderPatch,
        policy: TransitionPolicy,
    ) -> Result<Order, StoreError> {
        (**self).update_order(id, patch, policy).await
    }
}

#[derive(Debug, Default)]
struct Entries {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
}

/// In-memory order ledger for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderLedger {
    inner: RwLock<Entries>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn create_order(&self, order: Order) -> Result<Order, StoreError> {
        let mut entries = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if entries.index.contains_key(order.id()) {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.id()
            )));
        }
        let slot = entries.orders.len();
        entries.index.insert(order.id().clone(), slot);
        entries.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, StoreError> {
        let entries = self.inner.read().map_err(|_| StoreError::poisoned())?;
        entries
            .index
            .get(id)
            .map(|slot| entries.orders[*slot].clone())
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn list_orders_full(&self) -> Result<Vec<Order>, StoreError> {
        let entries = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(entries.orders.clone())
    }

    async fn query_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        let entries = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(query_orders(&entries.orders, filter, page)?)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let entries = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(entries
            .orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }

    async fn update_order(
        &self,
        id: &OrderId,
        patch: &OrderPatch,
        policy: TransitionPolicy,
    ) -> Result<Order, StoreError> {
        let mut entries = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let slot = *entries
            .index
            .get(id)
            .ok_or_else(|| StoreError::not_found("order", id))?;
        let order = &mut entries.orders[slot];
        order.apply_patch(patch, policy)?;
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockline_core::{Money, ProductId, UserId};

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            order_id: OrderId::from_raw(id),
            user_id: UserId::from_raw("u-1"),
            product_id: ProductId::from_raw("p-1"),
            quantity: 2,
            total_amount: Money::from_minor(2000),
            status,
            date: Utc::now(),
            delivery_date: None,
        }
    }

    #[tokio::test]
    async fn duplicate_order_id_conflicts() {
        let ledger = InMemoryOrderLedger::new();
        ledger.create_order(order("ORD-1", OrderStatus::Pending)).await.unwrap();
        let err = ledger
            .create_order(order("ORD-1", OrderStatus::Shipped))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(ledger.list_orders_full().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_by_status_keeps_insertion_order() {
        let ledger = InMemoryOrderLedger::new();
        for (id, status) in [
            ("ORD-3", OrderStatus::Shipped),
            ("ORD-1", OrderStatus::Pending),
            ("ORD-2", OrderStatus::Shipped),
        ] {
            ledger.create_order(order(id, status)).await.unwrap();
        }
        let shipped: Vec<_> = ledger
            .list_by_status(OrderStatus::Shipped)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_id.to_string())
            .collect();
        assert_eq!(shipped, vec!["ORD-3", "ORD-2"]);
    }

    #[tokio::test]
    async fn update_applies_patch_under_policy() {
        let ledger = InMemoryOrderLedger::new();
        ledger.create_order(order("ORD-1", OrderStatus::Delivered)).await.unwrap();
        let id = OrderId::from_raw("ORD-1");

        let strict = ledger
            .update_order(&id, &OrderPatch::status(OrderStatus::Pending), TransitionPolicy::Strict)
            .await;
        assert!(matches!(strict, Err(StoreError::Rejected(_))));

        let written = ledger
            .update_order(&id, &OrderPatch::status(OrderStatus::Pending), TransitionPolicy::Permissive)
            .await
            .unwrap();
        assert_eq!(written.status, OrderStatus::Pending);
        assert_eq!(ledger.get_order(&id).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn update_of_unknown_order_is_not_found() {
        let ledger = InMemoryOrderLedger::new();
        let err = ledger
            .update_order(
                &OrderId::from_raw("nope"),
                &OrderPatch::status(OrderStatus::Shipped),
                TransitionPolicy::Permissive,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "order", .. }));
    }
}
