//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the cache store, upstream fetcher, image cache
//! and retention pruning.

mod feed;
mod retention;

pub use feed::{FeedLookup, FeedService, FeedWhitelist};
pub use retention::{posts_beyond_retention, RetentionManager};
