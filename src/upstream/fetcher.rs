//! Remote feed fetcher
//!
//! Fetches one feed from the upstream API and maps its payload into the
//! internal model. A 404 is the distinct "feed does not exist" outcome;
//! everything else (transport errors, other non-2xx statuses, payload or
//! timestamp parse failures) is a generic fetch failure. No partial feed
//! is ever produced: one bad post aborts the whole fetch.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::data::{Feed, Post};
use crate::error::AppError;
use crate::metrics::{UPSTREAM_FETCHES_TOTAL, UPSTREAM_FETCH_DURATION_SECONDS};

/// Fixed-offset ISO 8601 layout used by the upstream timestamps,
/// e.g. "2024-05-01T12:30:00+0000". `%z` also accepts "Z".
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Client for the upstream feed API
pub struct FeedFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl FeedFetcher {
    /// Create a new fetcher
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (carries the request timeout)
    /// * `base_url` - API base URL the feed ID is appended to
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Fetch one feed from upstream.
    ///
    /// # Errors
    /// * `AppError::FeedNotExists` - upstream answered 404
    /// * `AppError::FetchFailed` - transport failure, other non-2xx
    ///   status, or an unparseable payload
    pub async fn fetch(&self, feed_id: &str) -> Result<Feed, AppError> {
        let url = format!("{}{}", self.base_url, feed_id);
        let timer = UPSTREAM_FETCH_DURATION_SECONDS.start_timer();

        let response = self.client.get(&url).send().await.map_err(|e| {
            UPSTREAM_FETCHES_TOTAL.with_label_values(&["error"]).inc();
            AppError::FetchFailed(format!("request to {url} failed: {e}"))
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            UPSTREAM_FETCHES_TOTAL
                .with_label_values(&["not_found"])
                .inc();
            return Err(AppError::FeedNotExists);
        }
        if !response.status().is_success() {
            UPSTREAM_FETCHES_TOTAL.with_label_values(&["error"]).inc();
            return Err(AppError::FetchFailed(format!(
                "fetching feed {feed_id}: status code {}",
                response.status()
            )));
        }

        let payload: FeedPayload = response.json().await.map_err(|e| {
            UPSTREAM_FETCHES_TOTAL.with_label_values(&["error"]).inc();
            AppError::FetchFailed(format!("parsing feed {feed_id}: {e}"))
        })?;

        let feed = map_payload(feed_id, payload)?;

        timer.observe_duration();
        UPSTREAM_FETCHES_TOTAL.with_label_values(&["ok"]).inc();
        tracing::debug!(feed_id, posts = feed.posts.len(), "Fetched feed from upstream");

        Ok(feed)
    }
}

/// Map the wire payload into the internal model.
///
/// Only the small media-size variant is retained; medium and large are
/// discarded at deserialization.
fn map_payload(feed_id: &str, payload: FeedPayload) -> Result<Feed, AppError> {
    let mut posts = Vec::with_capacity(payload.posts.len());
    for post in payload.posts {
        posts.push(Post {
            post_id: post.id,
            feed_id: feed_id.to_string(),
            permalink: post.permalink,
            timestamp: parse_timestamp(&post.timestamp)?,
            media_type: post.media_type,
            external_media_url: post.sizes.small.media_url,
            media_small_height: post.sizes.small.height,
            media_small_width: post.sizes.small.width,
            caption: post.caption,
            pruned_caption: post.pruned_caption,
        });
    }

    Ok(Feed {
        feed_id: feed_id.to_string(),
        username: payload.username,
        biography: payload.biography,
        profile_picture_url: payload.profile_picture_url,
        website: payload.website,
        followers_count: payload.followers_count,
        follows_count: payload.follows_count,
        // Overwritten by the store on upsert
        last_fetched: Utc::now(),
        posts,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| AppError::FetchFailed(format!("parsing timestamp {raw:?}: {e}")))
}

// =============================================================================
// Wire payload
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedPayload {
    username: String,
    #[serde(default)]
    biography: String,
    #[serde(default)]
    profile_picture_url: String,
    #[serde(default)]
    website: String,
    #[serde(default)]
    followers_count: i64,
    #[serde(default)]
    follows_count: i64,
    #[serde(default)]
    posts: Vec<PostPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostPayload {
    id: String,
    timestamp: String,
    permalink: String,
    media_type: String,
    sizes: SizesPayload,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    pruned_caption: String,
}

#[derive(Debug, Deserialize)]
struct SizesPayload {
    small: SizePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SizePayload {
    media_url: String,
    height: i64,
    width: i64,
}
