//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub images: ImageConfig,
    pub cache: CacheConfig,
    pub access: AccessConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Upstream feed API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the feed API; the feed ID is appended directly,
    /// so this must end with a slash.
    pub base_url: String,
    /// Request timeout in seconds for both feed fetches and
    /// image downloads.
    pub timeout_seconds: u64,
}

/// Local image cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Directory where cached image files are written
    pub directory: PathBuf,
    /// Public URL under which the directory is served
    /// e.g., "https://images.example.com"
    pub public_url: String,
}

/// Cache retention configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Seconds after which a cached feed is stale (default: 86400 = 24h)
    pub freshness_seconds: u64,
    /// Number of most recent posts served per feed (default: 6)
    pub retained_posts: usize,
}

/// Access control configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccessConfig {
    /// Comma-separated list of feed IDs allowed to be served.
    /// Empty means every feed ID is allowed.
    #[serde(default)]
    pub allowed_feed_ids: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (FEEDPROXY_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("upstream.base_url", "https://feeds.behold.so/")?
            .set_default("upstream.timeout_seconds", 30)?
            .set_default("images.public_url", "http://127.0.0.1:8080/images")?
            .set_default("cache.freshness_seconds", 86_400)?
            .set_default("cache.retained_posts", 6)?
            .set_default("access.allowed_feed_ids", "")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (FEEDPROXY_*)
            .add_source(
                Environment::with_prefix("FEEDPROXY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        if !self.upstream.base_url.ends_with('/') {
            return Err(crate::error::AppError::Config(
                "upstream.base_url must end with a slash".to_string(),
            ));
        }

        if self.images.directory.as_os_str().is_empty() {
            return Err(crate::error::AppError::Config(
                "images.directory must not be empty".to_string(),
            ));
        }

        if self.cache.freshness_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "cache.freshness_seconds must be greater than 0".to_string(),
            ));
        }

        if self.cache.retained_posts == 0 {
            return Err(crate::error::AppError::Config(
                "cache.retained_posts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/feedproxy-test.db"),
            },
            upstream: UpstreamConfig {
                base_url: "https://feeds.example.com/".to_string(),
                timeout_seconds: 30,
            },
            images: ImageConfig {
                directory: PathBuf::from("/tmp/feedproxy-images"),
                public_url: "https://images.example.com".to_string(),
            },
            cache: CacheConfig {
                freshness_seconds: 86_400,
                retained_posts: 6,
            },
            access: AccessConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_base_url_without_trailing_slash() {
        let mut config = valid_config();
        config.upstream.base_url = "https://feeds.example.com".to_string();

        let error = config
            .validate()
            .expect_err("base URL without trailing slash must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("upstream.base_url")
        ));
    }

    #[test]
    fn validate_rejects_zero_retention() {
        let mut config = valid_config();
        config.cache.retained_posts = 0;

        let error = config
            .validate()
            .expect_err("zero retained posts must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("cache.retained_posts")
        ));
    }

    #[test]
    fn validate_rejects_empty_image_directory() {
        let mut config = valid_config();
        config.images.directory = PathBuf::new();

        assert!(config.validate().is_err());
    }
}
