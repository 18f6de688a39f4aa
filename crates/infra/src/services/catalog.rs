use std::sync::Arc;

use tracing::instrument;

use stockline_catalog::{NewProduct, Product, ProductFilter, ProductPatch};
use stockline_core::{Page, PageRequest, ProductId};

use crate::error::ServiceError;
use crate::notify::LowStockNotifier;
use crate::store::CatalogStore;

/// Product reads and direct edits.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    notifier: LowStockNotifier,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>, notifier: LowStockNotifier) -> Self {
        Self { catalog, notifier }
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        Ok(self.catalog.get_product(id).await?)
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, ServiceError> {
        filter.validate()?;
        Ok(self.catalog.list_products(filter, page).await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_product(&self, input: NewProduct) -> Result<Product, ServiceError> {
        let product = input.into_product(ProductId::generate())?;
        let product = self.catalog.create_product(product).await?;
        tracing::info!(product_id = %product.id, stock = product.stock, "product created");
        Ok(product)
    }

    /// Apply a direct edit. An edit that sets stock at or below the
    /// threshold triggers a low-stock notification.
    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ServiceError> {
        patch.validate()?;
        let product = self.catalog.update_product(id, &patch).await?;
        tracing::info!(product_id = %product.id, stock = product.stock, "product updated");

        if patch.stock.is_some() {
            self.notifier.notify_if_low(&product);
        }
        Ok(product)
    }
}

impl core::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}
