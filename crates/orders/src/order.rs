use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockline_catalog::Product;
use stockline_core::{DomainError, Entity, Money, OrderId, ProductId, UserId};

use crate::lifecycle::TransitionPolicy;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown order status '{wanted}' (expected one of: Pending, Processing, Shipped, Delivered, Cancelled)"
                ))
            })
    }
}

/// Order record as held by the ledger.
///
/// `order_id`, `user_id`, `product_id` and `date` never change after creation;
/// everything else moves only through `apply_patch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub delivery_date: Option<NaiveDate>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }
}

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Caller-chosen id; the placement service assigns one when absent.
    pub order_id: Option<OrderId>,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl NewOrder {
    /// Shape checks that need no catalog access.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_id.is_empty() {
            return Err(DomainError::validation("userId is required"));
        }
        if self.product_id.is_empty() {
            return Err(DomainError::validation("productId is required"));
        }
        if matches!(&self.order_id, Some(id) if id.is_empty()) {
            return Err(DomainError::validation("orderId cannot be blank"));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }
}

impl Order {
    /// Build a pending order against `product`, fixing `total_amount` at
    /// `price × quantity` as priced right now.
    pub fn place(
        order_id: OrderId,
        user_id: UserId,
        product: &Product,
        quantity: u32,
        date: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let total_amount = product.price.times(quantity)?;

        Ok(Order {
            order_id,
            user_id,
            product_id: product.id.clone(),
            quantity,
            total_amount,
            status: OrderStatus::Pending,
            date,
            delivery_date: None,
        })
    }

    /// Write the given fields. `total_amount` is taken as submitted, never
    /// recomputed from `quantity`.
    pub fn apply_patch(
        &mut self,
        patch: &OrderPatch,
        policy: TransitionPolicy,
    ) -> Result<(), DomainError> {
        patch.validate()?;
        if let Some(next) = patch.status {
            policy.ensure(self.status, next)?;
        }

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(total) = patch.total_amount {
            self.total_amount = total;
        }
        if let Some(delivery) = patch.delivery_date {
            self.delivery_date = Some(delivery);
        }
        Ok(())
    }
}

/// Editable order fields. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub quantity: Option<u32>,
    pub total_amount: Option<Money>,
    pub delivery_date: Option<NaiveDate>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.quantity.is_none()
            && self.total_amount.is_none()
            && self.delivery_date.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::validation("update must change at least one field"));
        }
        if self.quantity == Some(0) {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }
}
