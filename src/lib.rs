//! feedproxy - a caching proxy for a remote social-feed API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - GET /feeds/:id                                           │
//! │  - /health, /metrics                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Feed lookup orchestration                                │
//! │  - Retention pruning                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite cache store (sqlx)                                │
//! │  - Local image directory                                    │
//! │  - Upstream feed API (reqwest)                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers and response DTOs
//! - `service`: feed orchestration and retention pruning
//! - `data`: SQLite cache store and internal models
//! - `upstream`: remote feed API client
//! - `storage`: local image cache
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod upstream;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the cache store and feed service.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// SQLite cache store
    pub store: Arc<data::CacheStore>,

    /// Feed lookup service
    pub service: Arc<service::FeedService>,

    /// Retention manager (also reachable through the service; kept here
    /// so operators and tests can prune directly)
    pub retention: Arc<service::RetentionManager>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to the SQLite cache store (runs migrations)
    /// 2. Build the shared HTTP client
    /// 3. Prepare the local image cache directory
    /// 4. Wire up retention and the feed service
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to the cache store
        let store = Arc::new(
            data::CacheStore::connect(&config.database.path, config.cache.freshness_seconds)
                .await?,
        );
        tracing::info!("Cache store connected");

        // 2. Shared HTTP client for feed fetches and image downloads
        let http_client = reqwest::Client::builder()
            .user_agent("feedproxy/0.1.0")
            .timeout(std::time::Duration::from_secs(config.upstream.timeout_seconds))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let fetcher = Arc::new(upstream::FeedFetcher::new(
            http_client.clone(),
            config.upstream.base_url.clone(),
        ));

        // 3. Local image cache
        let images = Arc::new(storage::ImageCache::new(
            config.images.directory.clone(),
            config.images.public_url.clone(),
            http_client,
        )?);
        tracing::info!(directory = %config.images.directory.display(), "Image cache ready");

        // 4. Retention + orchestration
        let retention = Arc::new(service::RetentionManager::new(
            Arc::clone(&store),
            Arc::clone(&images),
            config.cache.retained_posts,
        ));

        let whitelist = service::FeedWhitelist::parse(&config.access.allowed_feed_ids);
        let feed_service = Arc::new(service::FeedService::new(
            Arc::clone(&store),
            fetcher,
            images,
            Arc::clone(&retention),
            whitelist,
            config.cache.retained_posts,
        ));

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            store,
            service: feed_service,
            retention,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::feeds_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
