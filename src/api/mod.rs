//! API layer
//!
//! HTTP handlers for:
//! - Feed lookups (the proxy's single real endpoint)
//! - Metrics (Prometheus)

mod dto;
mod feeds;
pub mod metrics;

pub use dto::{FeedResponse, PostResponse};

pub use feeds::feeds_router;
pub use metrics::metrics_router;
