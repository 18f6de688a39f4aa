use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use stockline_catalog::{Product, ProductFilter, ProductPatch};
use stockline_core::{Entity, Page, PageRequest, ProductId, paginate};

use super::StoreError;

/// Product catalog boundary.
///
/// `decrement_stock_if_sufficient` is the only way stock goes down; it must
/// be a single conditional write so that concurrent callers can never drive
/// stock below zero.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: &ProductId) -> Result<Product, StoreError>;

    /// Filter then page, in catalog insertion order.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError>;

    async fn list_all_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Fails with `Conflict` if the id is taken.
    async fn create_product(&self, product: Product) -> Result<Product, StoreError>;

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, StoreError>;

    /// Take `quantity` units only if at least that many are in stock.
    /// Returns the product as written.
    async fn decrement_stock_if_sufficient(
        &self,
        id: &ProductId,
        quantity: u32,
    ) -> Result<Product, StoreError>;

    /// Put `quantity` units back. Returns the product as written.
    async fn restock(&self, id: &ProductId, quantity: u32) -> Result<Product, StoreError>;
}

#[async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn get_product(&self, id: &ProductId) -> Result<Product, StoreError> {
        (**self).get_product(id).await
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        (**self).list_products(filter, page).await
    }

    async fn list_all_products(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_all_products().await
    }

    async fn create_product(&self, product: Product) -> Result<Product, StoreError> {
        (**self).create_product(product).await
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, StoreError> {
        (**self).update_product(id, patch).await
    }

    async fn decrement_stock_if_sufficient(
        &self,
        id: &ProductId,
        quantity: u32,
    ) -> Result<Product, StoreError> {
        (**self).decrement_stock_if_sufficient(id, quantity).await
    }

    async fn restock(&self, id: &ProductId, quantity: u32) -> Result<Product, StoreError> {
        (**self).restock(id, quantity).await
    }
}

#[derive(Debug, Default)]
struct Shelves {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Shelves {
    fn get_mut(&mut self, id: &ProductId) -> Result<&mut Product, StoreError> {
        let slot = *self
            .index
            .get(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        Ok(&mut self.products[slot])
    }
}

/// In-memory catalog for tests/dev.
///
/// Every write runs under one write lock, which makes the conditional
/// decrement atomic.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<Shelves>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog, replacing any product with the same id.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut shelves = Shelves::default();
        for product in products {
            match shelves.index.get(product.id()) {
                Some(&slot) => shelves.products[slot] = product,
                None => {
                    shelves.index.insert(product.id().clone(), shelves.products.len());
                    shelves.products.push(product);
                }
            }
        }
        Self {
            inner: RwLock::new(shelves),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_product(&self, id: &ProductId) -> Result<Product, StoreError> {
        let shelves = self.inner.read().map_err(|_| StoreError::poisoned())?;
        shelves
            .index
            .get(id)
            .map(|slot| shelves.products[*slot].clone())
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let shelves = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let matching = shelves.products.iter().filter(|p| filter.matches(p));
        Ok(paginate(matching, page).map(Product::clone))
    }

    async fn list_all_products(&self) -> Result<Vec<Product>, StoreError> {
        let shelves = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(shelves.products.clone())
    }

    async fn create_product(&self, product: Product) -> Result<Product, StoreError> {
        let mut shelves = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if shelves.index.contains_key(product.id()) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id()
            )));
        }
        let slot = shelves.products.len();
        shelves.index.insert(product.id().clone(), slot);
        shelves.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, StoreError> {
        let mut shelves = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let product = shelves.get_mut(id)?;
        let mut next = product.clone();
        next.apply_patch(patch)?;
        *product = next.clone();
        Ok(next)
    }

    async fn decrement_stock_if_sufficient(
        &self,
        id: &ProductId,
        quantity: u32,
    ) -> Result<Product, StoreError> {
        let mut shelves = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let product = shelves.get_mut(id)?;
        if product.stock < quantity {
            return Err(StoreError::InsufficientStock {
                available: product.stock,
                requested: quantity,
            });
        }
        product.take_stock(quantity)?;
        Ok(product.clone())
    }

    async fn restock(&self, id: &ProductId, quantity: u32) -> Result<Product, StoreError> {
        let mut shelves = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let product = shelves.get_mut(id)?;
        product.return_stock(quantity)?;
        Ok(product.clone())
    }
}
