//! Infrastructure layer: storage, application services, notification
//! dispatch and configuration.
//!
//! Domain crates stay pure; this crate owns the locked unit of work that
//! applies their consumption plans.

pub mod config;
pub mod notifications;
pub mod services;
pub mod store;
