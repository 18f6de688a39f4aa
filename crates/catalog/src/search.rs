//! Product listing filter (name search + price/stock ranges).

use serde::{Deserialize, Serialize};

use stockline_core::{DomainError, Money};

use crate::product::Product;

/// Composite product predicate; every bound is inclusive and optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub min_stock: Option<u32>,
    pub max_stock: Option<u32>,
}

impl ProductFilter {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::validation("min price exceeds max price"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_stock, self.max_stock) {
            if min > max {
                return Err(DomainError::validation("min stock exceeds max stock"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };

        name_ok
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && self.min_stock.is_none_or(|min| product.stock >= min)
            && self.max_stock.is_none_or(|max| product.stock <= max)
    }
}
