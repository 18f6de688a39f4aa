//! Order status transition table.
//!
//! The lifecycle is tracked, not necessarily enforced: `Permissive` lets any
//! status follow any other (the historical behaviour), `Strict` applies the
//! forward-only table below.
//!
//! ```text
//! Pending ──► Processing ──► Shipped ──► Delivered
//!    │            │
//!    └────────────┴──► Cancelled
//! ```

use serde::{Deserialize, Serialize};

use stockline_core::DomainError;

use crate::order::OrderStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status may move to any other; no terminal states.
    #[default]
    Permissive,
    /// Forward-only lifecycle; Delivered and Cancelled are terminal.
    Strict,
}

impl TransitionPolicy {
    pub fn allows(self, from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;

        if from == to {
            return true;
        }
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (Pending, Processing)
                    | (Pending, Cancelled)
                    | (Processing, Shipped)
                    | (Processing, Cancelled)
                    | (Shipped, Delivered)
            ),
        }
    }

    pub fn ensure(self, from: OrderStatus, to: OrderStatus) -> Result<(), DomainError> {
        if self.allows(from, to) {
            return Ok(());
        }
        let next = self.next_statuses(from);
        let allowed = if next.is_empty() {
            format!("{from} is final")
        } else {
            let names: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
            format!("allowed: {}", names.join(", "))
        };
        Err(DomainError::validation(format!(
            "order status cannot move from {from} to {to} ({allowed})"
        )))
    }

    /// Statuses reachable in one step from `from` (excluding `from` itself).
    pub fn next_statuses(self, from: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|to| *to != from && self.allows(from, *to))
            .collect()
    }
}

impl core::str::FromStr for TransitionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(DomainError::validation(format!(
                "unknown transition policy '{other}' (expected permissive or strict)"
            ))),
        }
    }
}
