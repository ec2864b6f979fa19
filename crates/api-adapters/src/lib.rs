//! # api-adapters
//!
//! HTTP surface of the blob backend. The axum router is compiled with the `web-axum`
//! feature; request metrics are always available.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod axum_adapter;

pub use metrics::HttpMetrics;

#[cfg(feature = "web-axum")]
pub use axum_adapter::{router, ApiError, AppState};
