//! Storage boundary for the three external record stores.
//!
//! Each store is an async trait with an in-memory implementation for tests
//! and dev; the catalog and the ledger also have Postgres implementations
//! behind the `postgres` feature.

pub mod catalog;
pub mod ledger;
pub mod users;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use catalog::{CatalogStore, InMemoryCatalogStore};
pub use ledger::{InMemoryOrderLedger, OrderLedger};
pub use users::{HttpUserDirectory, InMemoryUserDirectory, UserDirectory};

use thiserror::Error;

use stockline_core::DomainError;

/// Store operation error.
///
/// These are infrastructure errors; shape and business-rule checks happen in
/// the domain crates before a store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A record with the same key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Conditional stock decrement refused.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: u32, requested: u32 },

    /// A record-level rule refused the write (e.g. an edit that fails
    /// validation against the stored record).
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// The backing store failed (IO, poisoned lock, database error).
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        Self::Backend("lock poisoned".to_string())
    }
}
