//! Service-level error model.

use thiserror::Error;

use stockline_core::{DomainError, OrderId, ProductId};

use crate::store::StoreError;

/// What a service call can fail with.
///
/// Every variant maps to one HTTP status at the API edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Input or business-rule failure; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    /// A collaborator (store, ledger, HTTP service) failed.
    #[error("external service failure: {0}")]
    ExternalService(String),

    /// Stock was taken but the order was not recorded and the stock could
    /// not be returned. Carries what a reconciliation job needs to restock.
    #[error(
        "partial inconsistency: {quantity} units of product {product_id} taken for order {order_id} were not returned: {reason}"
    )]
    PartialInconsistency {
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        reason: String,
    },
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            // Invariant failures come from rejected input (e.g. amount overflow).
            DomainError::InvariantViolation(msg) => Self::Validation(msg),
            DomainError::NotFound { entity, id } => Self::NotFound { entity, id },
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::InsufficientStock {
                available,
                requested,
            } => Self::Validation(format!(
                "insufficient stock: {available} available, {requested} requested"
            )),
            StoreError::Rejected(domain) => domain.into(),
            StoreError::Backend(msg) => Self::ExternalService(msg),
        }
    }
}
