//! Order placement: stock check, conditional decrement, order write.
//!
//! ```text
//! get_product ─► ensure 0 < qty ≤ stock ─► decrement_stock_if_sufficient
//!                                                  │
//!                             create_order ◄───────┘
//!                                  │ fails
//!                                  ▼
//!                               restock ──fails──► PartialInconsistency
//! ```
//!
//! The only write that can leave the two stores disagreeing is a failed
//! restock after a failed order write; it is reported, never hidden.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use stockline_core::{OrderId, ProductId};
use stockline_orders::{NewOrder, Order};

use crate::error::ServiceError;
use crate::notify::LowStockNotifier;
use crate::store::{CatalogStore, OrderLedger, StoreError};

#[derive(Clone)]
pub struct OrderPlacementService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn OrderLedger>,
    notifier: LowStockNotifier,
}

impl OrderPlacementService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn OrderLedger>,
        notifier: LowStockNotifier,
    ) -> Self {
        Self {
            catalog,
            ledger,
            notifier,
        }
    }

    /// Place an order and take its stock.
    ///
    /// On success the product's stock is lower by exactly `quantity` and the
    /// ledger holds one more Pending order. On `Validation`/`NotFound` nothing
    /// was written.
    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, user_id = %request.user_id, quantity = request.quantity),
        err
    )]
    pub async fn place_order(&self, request: NewOrder) -> Result<Order, ServiceError> {
        request.validate()?;

        let product = self.catalog.get_product(&request.product_id).await?;
        product.ensure_can_fulfil(request.quantity)?;

        // Lost races with a concurrent placement surface here as
        // InsufficientStock, which maps to Validation.
        let updated = self
            .catalog
            .decrement_stock_if_sufficient(&product.id, request.quantity)
            .await?;

        let order_id = request.order_id.clone().unwrap_or_else(OrderId::next);
        let placed = Order::place(
            order_id.clone(),
            request.user_id.clone(),
            &updated,
            request.quantity,
            Utc::now(),
        );
        let order = match placed {
            Ok(order) => order,
            Err(err) => {
                return Err(self
                    .compensate(&order_id, &updated.id, request.quantity, err.into())
                    .await);
            }
        };

        let order = match self.ledger.create_order(order).await {
            Ok(order) => order,
            Err(err) => {
                let cause = match err {
                    StoreError::Conflict(msg) => ServiceError::Conflict(msg),
                    other => ServiceError::ExternalService(other.to_string()),
                };
                return Err(self
                    .compensate(&order_id, &updated.id, request.quantity, cause)
                    .await);
            }
        };

        tracing::info!(
            order_id = %order.order_id,
            total_amount = %order.total_amount,
            remaining_stock = updated.stock,
            "order placed"
        );

        self.notifier.notify_if_low(&updated);
        Ok(order)
    }

    /// Return the stock taken for an order that was not recorded.
    async fn compensate(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        quantity: u32,
        cause: ServiceError,
    ) -> ServiceError {
        match self.catalog.restock(product_id, quantity).await {
            Ok(product) => {
                tracing::warn!(
                    order_id = %order_id,
                    product_id = %product_id,
                    quantity,
                    stock = product.stock,
                    error = %cause,
                    "order not recorded; stock returned"
                );
                cause
            }
            Err(restock_err) => {
                tracing::error!(
                    order_id = %order_id,
                    product_id = %product_id,
                    quantity,
                    error = %cause,
                    restock_error = %restock_err,
                    "order not recorded and stock could not be returned; reconciliation required"
                );
                ServiceError::PartialInconsistency {
                    order_id: order_id.clone(),
                    product_id: product_id.clone(),
                    quantity,
                    reason: format!("{cause}; restock failed: {restock_err}"),
                }
            }
        }
    }
}

impl core::fmt::Debug for OrderPlacementService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderPlacementService").finish_non_exhaustive()
    }
}
