//! `plantops-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the shared error model, quantity helpers and the operator
//! context every public entry point receives.

pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod version;

pub use context::OperatorContext;
pub use entity::Entity;
pub use error::{DomainError, DomainResult, Shortage};
pub use id::{AggregateId, TenantId, UserId};
pub use version::{ExpectedVersion, Versioned};
