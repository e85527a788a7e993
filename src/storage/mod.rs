//! Local image storage module
//!
//! Handles:
//! - Lazy download of post images into the local cache directory
//! - Public URL derivation for cached files

mod images;

pub use images::ImageCache;
