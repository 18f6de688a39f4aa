//! Order reads and status/field updates.

use std::sync::Arc;

use tracing::instrument;

use stockline_core::{OrderId, Page, PageRequest};
use stockline_orders::{Order, OrderFilter, OrderPatch, OrderStatus, TransitionPolicy};

use crate::error::ServiceError;
use crate::store::OrderLedger;

/// Status transition manager plus the order query surface.
///
/// Updates never touch catalog stock.
#[derive(Clone)]
pub struct OrderService {
    ledger: Arc<dyn OrderLedger>,
    policy: TransitionPolicy,
}

impl OrderService {
    pub fn new(ledger: Arc<dyn OrderLedger>, policy: TransitionPolicy) -> Self {
        Self { ledger, policy }
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError> {
        Ok(self.ledger.get_order(id).await?)
    }

    /// Filter then page the ledger.
    pub async fn query_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, ServiceError> {
        filter.validate()?;
        Ok(self.ledger.query_orders(filter, page).await?)
    }

    /// Every order currently in `status`, in ledger order.
    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, ServiceError> {
        Ok(self.ledger.list_by_status(status).await?)
    }

    #[instrument(skip(self, patch), fields(order_id = %id, policy = ?self.policy), err)]
    pub async fn update_order(
        &self,
        id: &OrderId,
        patch: OrderPatch,
    ) -> Result<Order, ServiceError> {
        patch.validate()?;
        let order = self.ledger.update_order(id, &patch, self.policy).await?;
        tracing::info!(
            order_id = %order.order_id,
            status = %order.status,
            "order updated"
        );
        Ok(order)
    }
}

impl core::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
