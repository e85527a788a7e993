//! Cache store tests

use super::*;
use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

/// Helper to create a test store with the default 24h window
async fn create_test_store() -> (CacheStore, TempDir) {
    create_test_store_with_window(86_400).await
}

async fn create_test_store_with_window(freshness_seconds: u64) -> (CacheStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let store = CacheStore::connect(&db_path, freshness_seconds)
        .await
        .unwrap();
    (store, temp_dir)
}

fn sample_post(feed_id: &str, post_id: &str, hour: u32) -> Post {
    Post {
        post_id: post_id.to_string(),
        feed_id: feed_id.to_string(),
        permalink: format!("https://social.example.com/p/{post_id}"),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
        media_type: "IMAGE".to_string(),
        external_media_url: format!("https://cdn.example.com/{post_id}.webp"),
        media_small_height: 320,
        media_small_width: 320,
        caption: "caption #tagged".to_string(),
        pruned_caption: "caption".to_string(),
    }
}

fn sample_feed(feed_id: &str, post_count: u32) -> Feed {
    Feed {
        feed_id: feed_id.to_string(),
        username: "someuser".to_string(),
        biography: "bio".to_string(),
        profile_picture_url: "https://cdn.example.com/profile.webp".to_string(),
        website: "https://example.com".to_string(),
        followers_count: 100,
        follows_count: 50,
        last_fetched: Utc::now(),
        posts: (0..post_count)
            .map(|i| sample_post(feed_id, &format!("{feed_id}-post-{i}"), i))
            .collect(),
    }
}

#[tokio::test]
async fn upsert_then_lookup_returns_feed_and_posts() {
    let (store, _temp_dir) = create_test_store().await;

    let feed = sample_feed("feed-a", 3);
    store.upsert(&feed).await.unwrap();

    let found = store.lookup_fresh("feed-a").await.unwrap().unwrap();
    assert_eq!(found.feed_id, "feed-a");
    assert_eq!(found.username, "someuser");
    assert_eq!(found.posts.len(), 3);
    // Posts come back newest first
    assert_eq!(found.posts[0].post_id, "feed-a-post-2");
    assert_eq!(
        found.posts[0].external_media_url,
        "https://cdn.example.com/feed-a-post-2.webp"
    );
}

#[tokio::test]
async fn lookup_unknown_feed_returns_none() {
    let (store, _temp_dir) = create_test_store().await;
    assert!(store.lookup_fresh("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn lookup_treats_stale_feed_as_absent() {
    // 1 second window: the feed goes stale almost immediately
    let (store, _temp_dir) = create_test_store_with_window(1).await;

    let feed = sample_feed("feed-stale", 1);
    store.upsert(&feed).await.unwrap();

    assert!(store.lookup_fresh("feed-stale").await.unwrap().is_some());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    // Staleness and absence are the same signal
    assert!(store.lookup_fresh("feed-stale").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_replaces_feed_wholesale() {
    let (store, _temp_dir) = create_test_store().await;

    let mut feed = sample_feed("feed-b", 2);
    store.upsert(&feed).await.unwrap();

    feed.username = "renamed".to_string();
    feed.followers_count = 123;
    store.upsert(&feed).await.unwrap();

    let found = store.lookup_fresh("feed-b").await.unwrap().unwrap();
    assert_eq!(found.username, "renamed");
    assert_eq!(found.followers_count, 123);
    assert_eq!(found.posts.len(), 2);
}

#[tokio::test]
async fn upsert_stamps_last_fetched() {
    let (store, _temp_dir) = create_test_store().await;

    let mut feed = sample_feed("feed-c", 1);
    // A stale stamp on the in-memory model must not survive the write
    feed.last_fetched = Utc::now() - Duration::days(30);
    let written = store.upsert(&feed).await.unwrap();

    assert!(Utc::now() - written < Duration::seconds(5));
    assert!(store.lookup_fresh("feed-c").await.unwrap().is_some());
}

#[tokio::test]
async fn failed_upsert_rolls_back_feed_and_posts() {
    let (store, _temp_dir) = create_test_store().await;

    let mut feed = sample_feed("feed-d", 3);
    // Empty post ID violates the schema CHECK on the last row
    feed.posts[2].post_id = String::new();

    let result = store.upsert(&feed).await;
    assert!(result.is_err());

    // Neither the feed row nor any post row may remain
    assert!(store.lookup_fresh("feed-d").await.unwrap().is_none());
    assert!(store.post_ids_ascending("feed-d").await.unwrap().is_empty());
}

#[tokio::test]
async fn external_media_url_point_lookup() {
    let (store, _temp_dir) = create_test_store().await;

    let feed = sample_feed("feed-e", 1);
    store.upsert(&feed).await.unwrap();

    let url = store.external_media_url("feed-e-post-0").await.unwrap();
    assert_eq!(url, "https://cdn.example.com/feed-e-post-0.webp");

    let err = store.external_media_url("missing").await.unwrap_err();
    assert!(matches!(err, crate::error::AppError::PostNotFound(_)));
}

#[tokio::test]
async fn post_id_listings_are_ordered() {
    let (store, _temp_dir) = create_test_store().await;

    let feed = sample_feed("feed-f", 8);
    store.upsert(&feed).await.unwrap();

    let recent = store.recent_post_ids("feed-f", 6).await.unwrap();
    assert_eq!(recent.len(), 6);
    assert_eq!(recent[0], "feed-f-post-7");
    assert_eq!(recent[5], "feed-f-post-2");

    let ascending = store.post_ids_ascending("feed-f").await.unwrap();
    assert_eq!(ascending.len(), 8);
    assert_eq!(ascending[0], "feed-f-post-0");
    assert_eq!(ascending[7], "feed-f-post-7");
}

#[tokio::test]
async fn delete_posts_is_idempotent() {
    let (store, _temp_dir) = create_test_store().await;

    let feed = sample_feed("feed-g", 4);
    store.upsert(&feed).await.unwrap();

    let victims = vec![
        "feed-g-post-0".to_string(),
        "feed-g-post-1".to_string(),
    ];
    assert_eq!(store.delete_posts(&victims).await.unwrap(), 2);
    // Deleting again removes nothing and does not fail
    assert_eq!(store.delete_posts(&victims).await.unwrap(), 0);
    assert_eq!(store.delete_posts(&[]).await.unwrap(), 0);

    let remaining = store.post_ids_ascending("feed-g").await.unwrap();
    assert_eq!(remaining, vec!["feed-g-post-2", "feed-g-post-3"]);
}
