//! Composite order filter and the single `query(filter, page)` contract.
//!
//! Every predicate (status, id search, amount range, date range) is folded
//! into one filter that runs over the whole ledger *before* the page is cut,
//! so `total_matching` always describes the fully filtered set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockline_core::{DomainError, Money, Page, PageRequest, paginate};

use crate::order::{Order, OrderStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring of the order id.
    pub search: Option<String>,
    /// Inclusive lower bound on `total_amount`.
    pub min_amount: Option<Money>,
    /// Inclusive upper bound on `total_amount`.
    pub max_amount: Option<Money>,
    /// Inclusive lower bound on the calendar date (UTC) of `date`.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the calendar date (UTC) of `date`.
    pub end_date: Option<NaiveDate>,
}

impl OrderFilter {
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                return Err(DomainError::validation("min amount exceeds max amount"));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(DomainError::validation("start date is after end date"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, order: &Order) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => order
                .order_id
                .as_str()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };
        let day = order.date.date_naive();

        search_ok
            && self.status.is_none_or(|s| order.status == s)
            && self.min_amount.is_none_or(|min| order.total_amount >= min)
            && self.max_amount.is_none_or(|max| order.total_amount <= max)
            && self.start_date.is_none_or(|start| day >= start)
            && self.end_date.is_none_or(|end| day <= end)
    }
}

/// Filter then page `orders`, keeping their iteration (ledger insertion) order.
pub fn query_orders<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    filter: &OrderFilter,
    request: PageRequest,
) -> Result<Page<Order>, DomainError> {
    filter.validate()?;
    let matching = orders.into_iter().filter(|o| filter.matches(o));
    Ok(paginate(matching, request).map(Order::clone))
}
