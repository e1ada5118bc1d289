//! # Image Cache Store
//!
//! Persists the remote record of every image between runs so albums whose
//! cached photo count already matches can skip the remote listing.
//!
//! ## Format
//!
//! A JSON object keyed by image id:
//!
//! ```json
//! {
//!   "IMG1": {
//!     "album_id": "trip",
//!     "timestamp": 1700000000,
//!     "caption": "Sunset",
//!     "keywords": ["beach", "sea"]
//!   }
//! }
//! ```
//!
//! The cache is advisory. An unreadable or corrupt file loads as empty; the
//! next run simply lists more albums.

use crate::records::ImageRecord;
use crate::{Result, SyncError};
use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub type CacheEntries = BTreeMap<String, ImageRecord>;

#[derive(Clone)]
pub struct ImageCache {
    file_system: Arc<dyn FileSystemAccess>,
    path: Option<PathBuf>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("path", &self.path)
            .finish()
    }
}

impl ImageCache {
    /// `path = None` disables caching: loads are empty and saves are no-ops
    pub fn new(file_system: Arc<dyn FileSystemAccess>, path: Option<PathBuf>) -> Self {
        Self { file_system, path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Reads the cache, degrading to empty on any failure
    pub async fn load(&self) -> CacheEntries {
        let Some(path) = self.path.as_deref() else {
            return CacheEntries::new();
        };

        match self.file_system.exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(path = ?path, "No image cache yet");
                return CacheEntries::new();
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Cannot check image cache, starting cold");
                return CacheEntries::new();
            }
        }

        let data = match self.file_system.read_file(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = ?path, error = %e, "Cannot read image cache, starting cold");
                return CacheEntries::new();
            }
        };

        match decode(&data) {
            Ok(entries) => {
                debug!(path = ?path, count = entries.len(), "Loaded image cache");
                entries
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Ignoring corrupt image cache");
                CacheEntries::new()
            }
        }
    }

    pub async fn save(&self, entries: &CacheEntries) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let data = encode(entries)?;
        self.file_system.write_file(path, data).await?;
        debug!(path = ?path, count = entries.len(), "Saved image cache");
        Ok(())
    }
}

pub fn encode(entries: &CacheEntries) -> Result<Bytes> {
    serde_json::to_vec_pretty(entries)
        .map(Bytes::from)
        .map_err(|e| SyncError::Cache(format!("failed to encode image cache: {}", e)))
}

pub fn decode(data: &[u8]) -> Result<CacheEntries> {
    serde_json::from_slice(data)
        .map_err(|e| SyncError::Cache(format!("failed to decode image cache: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Keywords;
    use bridge_desktop::TokioFileSystem;

    fn entries() -> CacheEntries {
        let mut entries = CacheEntries::new();
        entries.insert(
            "IMG1".to_string(),
            ImageRecord::new("trip", 1_700_000_000, "Sunset", Keywords::parse("sea, beach")),
        );
        entries.insert(
            "IMG2".to_string(),
            ImageRecord::new("home", 1_700_000_100, "", Keywords::new()),
        );
        entries
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not json"), Err(SyncError::Cache(_))));
    }

    #[test]
    fn test_encoded_shape() {
        let data = encode(&entries()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["IMG1"]["album_id"], "trip");
        assert_eq!(value["IMG1"]["keywords"], serde_json::json!(["beach", "sea"]));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(
            Arc::new(TokioFileSystem::new()),
            Some(dir.path().join("state").join("images.json")),
        );

        cache.save(&entries()).await.unwrap();
        assert_eq!(cache.load().await, entries());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.json");
        let cache = ImageCache::new(Arc::new(TokioFileSystem::new()), Some(path.clone()));

        assert!(cache.load().await.is_empty());

        std::fs::write(&path, b"{ truncated").unwrap();
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = ImageCache::new(Arc::new(TokioFileSystem::new()), None);
        assert!(!cache.is_enabled());
        cache.save(&entries()).await.unwrap();
        assert!(cache.load().await.is_empty());
    }
}
