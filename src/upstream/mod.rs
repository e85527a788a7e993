//! Upstream feed API client
//!
//! One outbound GET per cache miss; no retries, no backoff.

mod fetcher;

pub use fetcher::FeedFetcher;
