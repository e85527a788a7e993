//! Local image cache
//!
//! Guarantees a locally servable URL for a post's small media asset.
//! The first request for a post downloads the file; every later request
//! is satisfied by the file's existence alone. Cached files are never
//! re-validated or refreshed; they disappear only when retention pruning
//! removes their post.

use std::path::{Path, PathBuf};

use crate::data::CacheStore;
use crate::error::AppError;
use crate::metrics::IMAGE_DOWNLOADS_TOTAL;

/// Image cache backed by a local directory
///
/// Files are named `{post_id}.webp` and served under `public_url`.
pub struct ImageCache {
    /// Directory cached image files are written to
    directory: PathBuf,
    /// Public URL base the directory is served under
    /// e.g., "https://images.example.com"
    public_url: String,
    /// HTTP client for downloads (shared, carries the timeout)
    client: reqwest::Client,
}

impl ImageCache {
    /// Create a new image cache
    ///
    /// Creates the cache directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created
    pub fn new(
        directory: PathBuf,
        public_url: String,
        client: reqwest::Client,
    ) -> Result<Self, AppError> {
        std::fs::create_dir_all(&directory).map_err(|e| {
            AppError::Config(format!(
                "cannot create image directory {}: {e}",
                directory.display()
            ))
        })?;

        Ok(Self {
            directory,
            public_url,
            client,
        })
    }

    /// Ensure a post's image exists locally and return its public URL.
    ///
    /// If the file is already present no network access happens. On a
    /// miss the original remote URL is resolved through the store
    /// (propagating unknown posts) and the body is downloaded to a
    /// temporary path, then renamed into place once complete. A failed
    /// download therefore never leaves a file that would later pass as
    /// a cache hit.
    pub async fn ensure_local(&self, store: &CacheStore, post_id: &str) -> Result<String, AppError> {
        let file_name = Self::file_name(post_id);
        let file_path = self.directory.join(&file_name);

        if file_path.exists() {
            return Ok(self.public_url_for(post_id));
        }

        let remote_url = store.external_media_url(post_id).await?;
        self.download(&remote_url, &file_path).await?;

        tracing::debug!(post_id, "Downloaded image into local cache");
        Ok(self.public_url_for(post_id))
    }

    /// Remove a post's cached image file if present.
    ///
    /// Missing files are fine; only a failing unlink is an error.
    pub async fn remove(&self, post_id: &str) -> Result<(), AppError> {
        let file_path = self.directory.join(Self::file_name(post_id));
        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::ImageResolution(format!(
                "removing {}: {e}",
                file_path.display()
            ))),
        }
    }

    /// Public URL for a post's cached image
    pub fn public_url_for(&self, post_id: &str) -> String {
        format!("{}/{}", self.public_url, Self::file_name(post_id))
    }

    fn file_name(post_id: &str) -> String {
        format!("{post_id}.webp")
    }

    /// Download a remote image to `destination`.
    ///
    /// The body is buffered to `{destination}.part` and renamed once the
    /// full body has been received.
    async fn download(&self, url: &str, destination: &Path) -> Result<(), AppError> {
        let fail = |msg: String| {
            IMAGE_DOWNLOADS_TOTAL.with_label_values(&["error"]).inc();
            AppError::ImageResolution(msg)
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(format!("downloading {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(fail(format!(
                "downloading {url}: status code {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fail(format!("reading body of {url}: {e}")))?;

        let part_path = destination.with_extension("webp.part");
        tokio::fs::write(&part_path, &body)
            .await
            .map_err(|e| fail(format!("writing {}: {e}", part_path.display())))?;
        tokio::fs::rename(&part_path, destination)
            .await
            .map_err(|e| fail(format!("renaming {}: {e}", part_path.display())))?;

        IMAGE_DOWNLOADS_TOTAL.with_label_values(&["ok"]).inc();
        Ok(())
    }
}
