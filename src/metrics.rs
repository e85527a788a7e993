//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Cache Metrics
    pub static ref FEED_CACHE_HITS_TOTAL: IntCounter = IntCounter::new(
        "feedproxy_feed_cache_hits_total",
        "Total number of feed lookups served from the local cache"
    ).expect("metric can be created");
    pub static ref FEED_CACHE_MISSES_TOTAL: IntCounter = IntCounter::new(
        "feedproxy_feed_cache_misses_total",
        "Total number of feed lookups that required an upstream fetch"
    ).expect("metric can be created");

    // Upstream Metrics
    pub static ref UPSTREAM_FETCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedproxy_upstream_fetches_total", "Total number of upstream feed fetches"),
        &["status"]
    ).expect("metric can be created");
    pub static ref UPSTREAM_FETCH_DURATION_SECONDS: prometheus::Histogram = prometheus::Histogram::with_opts(
        HistogramOpts::new(
            "feedproxy_upstream_fetch_duration_seconds",
            "Upstream feed fetch duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    ).expect("metric can be created");

    // Image Cache Metrics
    pub static ref IMAGE_DOWNLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedproxy_image_downloads_total", "Total number of image downloads"),
        &["status"]
    ).expect("metric can be created");

    // Retention Metrics
    pub static ref PRUNED_POSTS_TOTAL: IntCounter = IntCounter::new(
        "feedproxy_pruned_posts_total",
        "Total number of posts removed by retention pruning"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("feedproxy_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(FEED_CACHE_HITS_TOTAL.clone()))
        .expect("FEED_CACHE_HITS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FEED_CACHE_MISSES_TOTAL.clone()))
        .expect("FEED_CACHE_MISSES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(UPSTREAM_FETCHES_TOTAL.clone()))
        .expect("UPSTREAM_FETCHES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(UPSTREAM_FETCH_DURATION_SECONDS.clone()))
        .expect("UPSTREAM_FETCH_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(IMAGE_DOWNLOADS_TOTAL.clone()))
        .expect("IMAGE_DOWNLOADS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(PRUNED_POSTS_TOTAL.clone()))
        .expect("PRUNED_POSTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
