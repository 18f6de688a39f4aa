//! Strongly-typed identifiers used across the domain.
//!
//! Records come from external stores that key them with opaque strings, so
//! every identifier is a string newtype. System-assigned ids are derived from
//! UUIDv7 (time-ordered).

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Identifier of an order in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

/// Identifier of a user (customer account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap an existing identifier without validation.
            ///
            /// Prefer `parse` for untrusted input.
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Generate a fresh identifier from a UUIDv7.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if trimmed.chars().any(char::is_control) {
                    return Err(DomainError::invalid_id(format!(
                        "{}: contains control characters",
                        $name
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_id!(ProductId, "ProductId");
impl_string_id!(OrderId, "OrderId");
impl_string_id!(UserId, "UserId");

impl OrderId {
    /// Human-friendly order number: `ORD-` followed by 12 upper-case hex digits.
    ///
    /// Uses the random tail of a UUIDv7 so two ids minted in the same
    /// millisecond still differ.
    pub fn next() -> Self {
        let simple = Uuid::now_v7().simple().to_string().to_uppercase();
        let tail = &simple[simple.len() - 12..];
        Self(format!("ORD-{tail}"))
    }
}
