//! Common test utilities for E2E tests

use feedproxy::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
///
/// Runs the real router against a temp-dir SQLite database and image
/// directory. The upstream feed API is expected to be mocked (wiremock)
/// and its base URL passed in.
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub image_dir: std::path::PathBuf,
    pub client: reqwest::Client,
    pub _temp_dir: TempDir,
}

impl TestServer {
    /// Create a new test server with an unrestricted whitelist
    pub async fn new(upstream_base_url: &str) -> Self {
        Self::with_whitelist(upstream_base_url, "").await
    }

    /// Create a new test server with the given allow-list string
    pub async fn with_whitelist(upstream_base_url: &str, allowed_feed_ids: &str) -> Self {
        // Temporary directory for the test database and image cache
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let image_dir = temp_dir.path().join("images");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            upstream: config::UpstreamConfig {
                base_url: upstream_base_url.to_string(),
                timeout_seconds: 10,
            },
            images: config::ImageConfig {
                directory: image_dir.clone(),
                public_url: "http://images.test.example.com".to_string(),
            },
            cache: config::CacheConfig {
                freshness_seconds: 86_400,
                retained_posts: 6,
            },
            access: config::AccessConfig {
                allowed_feed_ids: allowed_feed_ids.to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };
        config.validate().unwrap();

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port and spawn the server
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let app = feedproxy::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            image_dir,
            client,
            _temp_dir: temp_dir,
        }
    }

    /// GET a path on the test server
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.addr, path))
            .send()
            .await
            .unwrap()
    }
}

/// Build an upstream feed payload with the given posts.
///
/// Each post is `(id, timestamp, media_url)`.
pub fn feed_payload(username: &str, posts: &[(&str, &str, &str)]) -> serde_json::Value {
    let posts: Vec<serde_json::Value> = posts
        .iter()
        .map(|(id, timestamp, media_url)| {
            serde_json::json!({
                "id": id,
                "timestamp": timestamp,
                "permalink": format!("https://social.example.com/p/{id}"),
                "mediaType": "IMAGE",
                "caption": format!("caption for {id} #tagged"),
                "prunedCaption": format!("caption for {id}"),
                "sizes": {
                    "small": {
                        "mediaUrl": media_url,
                        "height": 320,
                        "width": 320
                    },
                    "medium": {
                        "mediaUrl": format!("{media_url}?size=medium"),
                        "height": 640,
                        "width": 640
                    },
                    "large": {
                        "mediaUrl": format!("{media_url}?size=large"),
                        "height": 1280,
                        "width": 1280
                    }
                }
            })
        })
        .collect();

    serde_json::json!({
        "username": username,
        "biography": "test biography",
        "profilePictureUrl": "https://cdn.example.com/profile.webp",
        "website": "https://example.com",
        "followersCount": 100,
        "followsCount": 50,
        "posts": posts
    })
}
