//! Feed response DTOs
//!
//! The externally serialized shapes, kept separate from the internal
//! models so that internal-only fields (the original remote media URL,
//! the cache's `last_fetched` stamp) cannot leak into a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{Feed, Post};

/// Feed response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub id: String,
    pub username: String,
    pub biography: String,
    pub profile_picture_url: String,
    pub website: String,
    pub followers_count: i64,
    pub follows_count: i64,
    pub posts: Vec<PostResponse>,
}

/// Post response
///
/// `media_small_url` is the locally servable URL, never the remote one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub permalink: String,
    pub timestamp: DateTime<Utc>,
    pub media_type: String,
    pub media_small_url: String,
    pub media_small_height: i64,
    pub media_small_width: i64,
    pub caption: String,
    pub pruned_caption: String,
}

impl FeedResponse {
    /// Map an internal feed to the response shape.
    ///
    /// `local_urls[i]` is the locally servable image URL for
    /// `feed.posts[i]`; it replaces the internal remote URL.
    pub fn from_feed(feed: &Feed, local_urls: &[String]) -> Self {
        let posts = feed
            .posts
            .iter()
            .zip(local_urls)
            .map(|(post, local_url)| PostResponse::from_post(post, local_url.clone()))
            .collect();

        Self {
            id: feed.feed_id.clone(),
            username: feed.username.clone(),
            biography: feed.biography.clone(),
            profile_picture_url: feed.profile_picture_url.clone(),
            website: feed.website.clone(),
            followers_count: feed.followers_count,
            follows_count: feed.follows_count,
            posts,
        }
    }
}

impl PostResponse {
    fn from_post(post: &Post, media_small_url: String) -> Self {
        Self {
            id: post.post_id.clone(),
            permalink: post.permalink.clone(),
            timestamp: post.timestamp,
            media_type: post.media_type.clone(),
            media_small_url,
            media_small_height: post.media_small_height,
            media_small_width: post.media_small_width,
            caption: post.caption.clone(),
            pruned_caption: post.pruned_caption.clone(),
        }
    }
}
