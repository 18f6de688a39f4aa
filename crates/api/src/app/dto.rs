//! Query-string DTOs and their mapping to domain filters.
//!
//! Bodies (`NewOrder`, `OrderPatch`, `NewProduct`, `ProductPatch`) are
//! deserialized straight into the domain types; query strings carry plain
//! scalars and are converted here.

use chrono::NaiveDate;
use serde::Deserialize;

use stockline_catalog::ProductFilter;
use stockline_core::{Money, PageRequest};
use stockline_infra::ServiceError;
use stockline_orders::{OrderFilter, OrderStatus};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub min_amount: Option<u64>,
    pub max_amount: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderListQuery {
    pub fn into_parts(self) -> Result<(OrderFilter, PageRequest), ServiceError> {
        let status = self.status.as_deref().map(parse_status).transpose()?;
        let filter = OrderFilter {
            status,
            search: self.search,
            min_amount: self.min_amount.map(Money::from_minor),
            max_amount: self.max_amount.map(Money::from_minor),
            start_date: self.start_date,
            end_date: self.end_date,
        };
        let page = PageRequest::new(self.page, self.page_size)?;
        Ok((filter, page))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_stock: Option<u32>,
    pub max_stock: Option<u32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProductListQuery {
    pub fn into_parts(self) -> Result<(ProductFilter, PageRequest), ServiceError> {
        let filter = ProductFilter {
            search: self.search,
            min_price: self.min_price.map(Money::from_minor),
            max_price: self.max_price.map(Money::from_minor),
            min_stock: self.min_stock,
            max_stock: self.max_stock,
        };
        let page = PageRequest::new(self.page, self.page_size)?;
        Ok((filter, page))
    }
}

/// Case-insensitive status name, as used in paths and query strings.
pub fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    Ok(raw.parse::<OrderStatus>()?)
}
