//! Domain error model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// The first entity that failed an availability check.
///
/// Carried by [`DomainError::InsufficientStock`] and by shortage
/// notifications, so both report the same numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub item_name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub unit: String,
}

impl Shortage {
    /// How much is missing (`required - available`, never negative).
    pub fn deficit(&self) -> Decimal {
        (self.required - self.available).max(Decimal::ZERO)
    }
}

impl core::fmt::Display for Shortage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}: required {} {unit}, available {} {unit} (short {} {unit})",
            self.item_name,
            self.required,
            self.available,
            self.deficit(),
            unit = self.unit,
        )
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. missing field, non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced recipe, silo, item or run does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique key (e.g. product code) is already taken.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// A recipe ingredient is not bound to a usable inventory item.
    #[error("linkage error: {0}")]
    Linkage(String),

    /// The all-or-nothing availability check failed; nothing was deducted.
    #[error("insufficient stock for {0}")]
    InsufficientStock(Shortage),

    /// A lifecycle transition was attempted from a state that forbids it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A conflict occurred (referential protection or stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn linkage(msg: impl Into<String>) -> Self {
        Self::Linkage(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Stable machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::Duplicate(_) => "duplicate",
            DomainError::Linkage(_) => "linkage_error",
            DomainError::InsufficientStock(_) => "insufficient_stock",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}
