//! SQLite cache store
//!
//! All database access goes through this module.
//! Uses SQLx with a connection pool shared across requests.

use chrono::{Duration, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use super::models::{Feed, Post};
use crate::error::AppError;

/// Database-backed feed cache.
///
/// Lookups are freshness-gated: a feed whose `last_fetched` falls outside
/// the configured window is reported as absent, which makes staleness and
/// absence indistinguishable to callers. Both cause a full refetch.
pub struct CacheStore {
    pool: Pool<Sqlite>,
    freshness: Duration,
}

impl CacheStore {
    /// Connect to the SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    /// * `freshness_seconds` - Cache window after which a feed is stale
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path, freshness_seconds: u64) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self {
            pool,
            freshness: Duration::seconds(freshness_seconds as i64),
        })
    }

    /// Look up a feed and its posts, gated by the freshness window.
    ///
    /// # Returns
    /// `Some(feed)` only if the feed row exists and `last_fetched` is
    /// within the window. `None` covers both "never fetched" and "stale".
    pub async fn lookup_fresh(&self, feed_id: &str) -> Result<Option<Feed>, AppError> {
        let cutoff = Utc::now() - self.freshness;

        let feed = sqlx::query_as::<_, Feed>(
            "SELECT * FROM feeds WHERE feed_id = ? AND last_fetched >= ?",
        )
        .bind(feed_id)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut feed) = feed else {
            return Ok(None);
        };

        feed.posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE feed_id = ? ORDER BY timestamp DESC",
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(feed))
    }

    /// Insert or replace a feed and all of its posts atomically.
    ///
    /// Stamps `last_fetched = now`, then upserts the feed row and every
    /// post row in one transaction. Any single failure rolls the whole
    /// write back, leaving the previous state untouched.
    ///
    /// # Returns
    /// The `last_fetched` timestamp that was written.
    pub async fn upsert(&self, feed: &Feed) -> Result<chrono::DateTime<Utc>, AppError> {
        let last_fetched = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO feeds (
                feed_id, username, biography, profile_picture_url, website,
                followers_count, follows_count, last_fetched
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(feed_id) DO UPDATE SET
                username = excluded.username,
                biography = excluded.biography,
                profile_picture_url = excluded.profile_picture_url,
                website = excluded.website,
                followers_count = excluded.followers_count,
                follows_count = excluded.follows_count,
                last_fetched = excluded.last_fetched
            "#,
        )
        .bind(&feed.feed_id)
        .bind(&feed.username)
        .bind(&feed.biography)
        .bind(&feed.profile_picture_url)
        .bind(&feed.website)
        .bind(feed.followers_count)
        .bind(feed.follows_count)
        .bind(last_fetched)
        .execute(&mut *tx)
        .await?;

        for post in &feed.posts {
            sqlx::query(
                r#"
                INSERT INTO posts (
                    post_id, feed_id, permalink, timestamp, media_type,
                    media_small_url, media_small_height, media_small_width,
                    caption, pruned_caption
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(post_id) DO UPDATE SET
                    feed_id = excluded.feed_id,
                    permalink = excluded.permalink,
                    timestamp = excluded.timestamp,
                    media_type = excluded.media_type,
                    media_small_url = excluded.media_small_url,
                    media_small_height = excluded.media_small_height,
                    media_small_width = excluded.media_small_width,
                    caption = excluded.caption,
                    pruned_caption = excluded.pruned_caption
                "#,
            )
            .bind(&post.post_id)
            .bind(&post.feed_id)
            .bind(&post.permalink)
            .bind(post.timestamp)
            .bind(&post.media_type)
            .bind(&post.external_media_url)
            .bind(post.media_small_height)
            .bind(post.media_small_width)
            .bind(&post.caption)
            .bind(&post.pruned_caption)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(last_fetched)
    }

    /// Resolve a post's original remote media URL.
    ///
    /// Used when a local image file is missing and must be downloaded.
    pub async fn external_media_url(&self, post_id: &str) -> Result<String, AppError> {
        let url = sqlx::query_scalar::<_, String>(
            "SELECT media_small_url FROM posts WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        url.ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    /// IDs of the `n` most recently timestamped posts of a feed,
    /// newest first.
    pub async fn recent_post_ids(&self, feed_id: &str, n: usize) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT post_id FROM posts WHERE feed_id = ? ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(feed_id)
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// IDs of all posts of a feed, oldest first. Retention input.
    pub async fn post_ids_ascending(&self, feed_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT post_id FROM posts WHERE feed_id = ? ORDER BY timestamp ASC",
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Delete the given posts in a single statement.
    ///
    /// # Returns
    /// Number of rows actually deleted.
    pub async fn delete_posts(&self, post_ids: &[String]) -> Result<u64, AppError> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM posts WHERE post_id IN (");
        let mut separated = builder.separated(", ");
        for id in post_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}
