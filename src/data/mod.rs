//! Data layer module
//!
//! Handles all persistence:
//! - SQLite cache store (freshness-gated lookups, atomic upserts)
//! - Internal feed/post models

mod models;
mod store;

pub use models::{Feed, Post};
pub use store::CacheStore;

#[cfg(test)]
mod store_test;
