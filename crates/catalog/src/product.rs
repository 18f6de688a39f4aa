use serde::{Deserialize, Serialize};

use stockline_core::{DomainError, Entity, Money, ProductId};

/// Stock level at or below which a product counts as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 15;

/// Single threshold check shared by every low-stock trigger site.
pub fn is_low_stock(stock: u32) -> bool {
    stock <= LOW_STOCK_THRESHOLD
}

/// Catalog product record.
///
/// `stock` is unsigned, so a negative level cannot be represented;
/// `take_stock` refuses to underflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.stock)
    }

    /// Check that `quantity` units can be taken from the current stock.
    pub fn ensure_can_fulfil(&self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if quantity > self.stock {
            return Err(DomainError::validation(format!(
                "quantity {quantity} exceeds available stock {} for product {}",
                self.stock, self.id
            )));
        }
        Ok(())
    }

    /// Remove `quantity` units. Leaves the product untouched on error.
    pub fn take_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.ensure_can_fulfil(quantity)?;
        self.stock -= quantity;
        Ok(())
    }

    /// Return `quantity` units (compensation after a failed order write).
    pub fn return_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock overflow"))?;
        Ok(())
    }

    /// Apply a direct edit. Fields left `None` keep their value.
    pub fn apply_patch(&mut self, patch: &ProductPatch) -> Result<(), DomainError> {
        patch.validate()?;
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        Ok(())
    }
}

/// Input for creating a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId) -> Result<Product, DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Product {
            id,
            name: self.name.trim().to_string(),
            price: self.price,
            stock: self.stock,
        })
    }
}

/// Partial update of a product (direct edit screen).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::validation("update must change at least one field"));
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }
}
