//! Data models
//!
//! Rust structs representing the cached feed entities. These are the
//! internal shapes; the externally serialized DTOs live in `crate::api`.

use chrono::{DateTime, Utc};

/// A cached remote feed: profile header plus its posts.
///
/// Identified by the opaque external feed ID. The whole row set is
/// replaced on every stale refetch; fields are never merged one by one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub feed_id: String,
    pub username: String,
    pub biography: String,
    pub profile_picture_url: String,
    pub website: String,
    pub followers_count: i64,
    pub follows_count: i64,
    /// When this feed was last fetched from upstream. Drives the
    /// freshness window; never exposed externally.
    pub last_fetched: DateTime<Utc>,
    #[sqlx(skip)]
    pub posts: Vec<Post>,
}

/// One media item belonging to a feed.
///
/// Post IDs are assigned upstream and globally unique across feeds.
/// Created as part of a feed upsert, destroyed only by retention pruning.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub post_id: String,
    pub feed_id: String,
    pub permalink: String,
    /// Authoritative ordering key for retention and recency.
    pub timestamp: DateTime<Utc>,
    pub media_type: String,
    /// Original remote download URL for the small media variant.
    /// Internal only: it exists so a later image-cache miss can still
    /// resolve a download source, and must never be serialized into a
    /// response.
    #[sqlx(rename = "media_small_url")]
    pub external_media_url: String,
    pub media_small_height: i64,
    pub media_small_width: i64,
    pub caption: String,
    pub pruned_caption: String,
}
