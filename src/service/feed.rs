//! Feed lookup orchestration
//!
//! Composes the cache store, upstream fetcher, image cache and retention
//! manager into the per-request control flow: whitelist check, freshness
//! lookup, fetch + persist on miss, image population, response mapping,
//! and a spawned prune.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::FeedResponse;
use crate::data::{CacheStore, Feed};
use crate::error::AppError;
use crate::metrics::{FEED_CACHE_HITS_TOTAL, FEED_CACHE_MISSES_TOTAL};
use crate::service::RetentionManager;
use crate::storage::ImageCache;
use crate::upstream::FeedFetcher;

/// Optional allow-list of servable feed IDs.
///
/// Parsed once from the comma-separated configuration string with all
/// whitespace stripped. An empty list admits every identifier.
#[derive(Debug, Clone, Default)]
pub struct FeedWhitelist {
    allowed: HashSet<String>,
}

impl FeedWhitelist {
    /// Parse the configured comma-separated allow-list.
    pub fn parse(raw: &str) -> Self {
        let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let allowed = stripped
            .split(',')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
        Self { allowed }
    }

    /// Whether the given feed ID may be served.
    pub fn allows(&self, feed_id: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(feed_id)
    }
}

/// Result of a feed lookup.
///
/// Carries the response model together with the handle of the retention
/// prune spawned for the feed. The HTTP layer drops the handle (the prune
/// keeps running on the runtime); tests await it.
pub struct FeedLookup {
    pub feed: FeedResponse,
    pub prune: JoinHandle<()>,
}

/// Feed lookup service
pub struct FeedService {
    store: Arc<CacheStore>,
    fetcher: Arc<FeedFetcher>,
    images: Arc<ImageCache>,
    retention: Arc<RetentionManager>,
    whitelist: FeedWhitelist,
    /// Number of most recent posts served per lookup
    retained_posts: usize,
}

impl FeedService {
    /// Create a new feed service
    pub fn new(
        store: Arc<CacheStore>,
        fetcher: Arc<FeedFetcher>,
        images: Arc<ImageCache>,
        retention: Arc<RetentionManager>,
        whitelist: FeedWhitelist,
        retained_posts: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            images,
            retention,
            whitelist,
            retained_posts,
        }
    }

    /// Serve one feed lookup.
    ///
    /// # Flow
    /// 1. Whitelist check (terminal rejection)
    /// 2. Freshness-gated cache lookup
    /// 3. On miss/stale: single upstream fetch, then atomic persist
    /// 4. Image population for the retained window of posts
    /// 5. Response mapping (internal media URLs never leak)
    /// 6. Spawned retention prune, handle returned to the caller
    pub async fn get_feed(&self, feed_id: &str) -> Result<FeedLookup, AppError> {
        if !self.whitelist.allows(feed_id) {
            return Err(AppError::NotWhitelisted(feed_id.to_string()));
        }

        let feed = match self.store.lookup_fresh(feed_id).await? {
            Some(feed) => {
                FEED_CACHE_HITS_TOTAL.inc();
                tracing::debug!(feed_id, "Serving feed from local cache");
                feed
            }
            None => {
                FEED_CACHE_MISSES_TOTAL.inc();
                tracing::debug!(feed_id, "Feed missing or stale, fetching upstream");
                let fetched = self.fetcher.fetch(feed_id).await?;
                self.store.upsert(&fetched).await?;
                fetched
            }
        };

        let response = self.populate_images(feed).await?;

        let prune = self.retention.spawn_prune(feed_id.to_string());

        Ok(FeedLookup {
            feed: response,
            prune,
        })
    }

    /// Limit the feed to its retained window, ensure each post's image is
    /// cached locally, and map to the response model with the local URL
    /// substituted in.
    ///
    /// The window comes from the store (newest first, limited by query),
    /// so it holds on both the cache-hit path and right after a persist.
    async fn populate_images(&self, mut feed: Feed) -> Result<FeedResponse, AppError> {
        let recent = self
            .store
            .recent_post_ids(&feed.feed_id, self.retained_posts)
            .await?;

        let mut window = Vec::with_capacity(recent.len());
        for post_id in &recent {
            if let Some(post) = feed.posts.iter().find(|p| &p.post_id == post_id) {
                window.push(post.clone());
            }
        }
        feed.posts = window;

        let mut local_urls = Vec::with_capacity(feed.posts.len());
        for post in &feed.posts {
            let url = self.images.ensure_local(&self.store, &post.post_id).await?;
            local_urls.push(url);
        }

        Ok(FeedResponse::from_feed(&feed, &local_urls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_whitelist_admits_any_id() {
        let whitelist = FeedWhitelist::parse("");
        assert!(whitelist.allows("anything"));
        assert!(whitelist.allows(""));
    }

    #[test]
    fn populated_whitelist_rejects_absent_ids() {
        let whitelist = FeedWhitelist::parse("abc,def");
        assert!(whitelist.allows("abc"));
        assert!(whitelist.allows("def"));
        assert!(!whitelist.allows("ghi"));
    }

    #[test]
    fn stray_spaces_in_the_configured_list_are_ignored() {
        let whitelist = FeedWhitelist::parse(" abc , def ,ghi");
        assert!(whitelist.allows("abc"));
        assert!(whitelist.allows("def"));
        assert!(whitelist.allows("ghi"));
        assert!(!whitelist.allows(" abc"));
    }
}
