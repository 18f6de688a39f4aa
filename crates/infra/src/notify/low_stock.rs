use std::sync::Arc;

use tokio::task::JoinHandle;

use stockline_catalog::Product;

use super::dispatcher::{NotificationDispatcher, TemplateFields};
use crate::config::NotifySettings;

/// Fires one low-stock message per call, without blocking the caller.
///
/// There is no deduplication: every trigger sends.
#[derive(Clone)]
pub struct LowStockNotifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
    settings: Arc<NotifySettings>,
}

impl LowStockNotifier {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>, settings: NotifySettings) -> Self {
        Self {
            dispatcher,
            settings: Arc::new(settings),
        }
    }

    /// Spawn a dispatch if `product` is at or below the threshold.
    ///
    /// Returns the task handle when a message was triggered. Failures are
    /// logged and never reach the caller.
    pub fn notify_if_low(&self, product: &Product) -> Option<JoinHandle<()>> {
        if !product.is_low_stock() {
            return None;
        }
        Some(self.notify_low_stock(product))
    }

    /// Spawn a dispatch for `product` unconditionally.
    pub fn notify_low_stock(&self, product: &Product) -> JoinHandle<()> {
        let fields = TemplateFields::low_stock(product, &self.settings);
        let dispatcher = Arc::clone(&self.dispatcher);

        tokio::spawn(async move {
            match dispatcher.send(&fields).await {
                Ok(()) => tracing::info!(
                    product_id = %fields.product_id,
                    stock = fields.product_stock,
                    "low-stock notification sent"
                ),
                Err(err) => tracing::warn!(
                    product_id = %fields.product_id,
                    stock = fields.product_stock,
                    error = %err,
                    "low-stock notification failed"
                ),
            }
        })
    }
}

impl core::fmt::Debug for LowStockNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LowStockNotifier")
            .field("recipient", &self.settings.recipient)
            .finish_non_exhaustive()
    }
}
