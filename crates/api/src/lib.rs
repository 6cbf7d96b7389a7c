//! HTTP API: routing, operator context extraction and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;
