//! Remote Photo Service Abstractions
//!
//! Contract between the reconciliation core and a photo-hosting service.
//! Implementations own the wire protocol, authentication and retry policy;
//! the core only sees handle-bearing results or a typed [`BridgeError`].
//!
//! [`BridgeError`]: crate::error::BridgeError

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Live handle to an album as reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAlbum {
    /// Service-assigned album identifier
    pub id: String,
    pub title: String,
    /// Free-text description; managed albums embed a sync marker here
    pub summary: String,
    /// Album timestamp (epoch seconds)
    pub timestamp: i64,
    /// Number of photos the service reports for this album
    pub num_photos: u32,
}

/// Live handle to a photo as reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePhoto {
    /// Service-assigned photo identifier
    pub id: String,
    /// Service-assigned identifier of the containing album
    pub album_id: String,
    pub title: String,
    pub summary: String,
    /// Photo timestamp (epoch seconds)
    pub timestamp: i64,
    /// Comma separated keyword list, if any
    pub keywords: Option<String>,
}

/// Visibility of a remote album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumAccess {
    #[default]
    Private,
    Protected,
    Public,
}

impl AlbumAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumAccess::Private => "private",
            AlbumAccess::Protected => "protected",
            AlbumAccess::Public => "public",
        }
    }
}

/// Album fields sent on create/update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumFields {
    pub title: String,
    pub summary: String,
    pub timestamp: i64,
    /// Only set on create; updates leave the access level untouched
    pub access: Option<AlbumAccess>,
}

/// Photo fields sent on create/update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFields {
    pub title: String,
    pub summary: String,
    /// Comma separated keyword list
    pub keywords: String,
    pub timestamp: i64,
}

/// Upload content produced by a [`ContentTransform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaContent {
    /// Upload the file at `path` as-is (original or substitute file)
    File {
        path: PathBuf,
        content_type: Option<String>,
    },
    /// Upload an in-memory payload
    Payload { content_type: String, data: Bytes },
}

impl MediaContent {
    pub fn content_type(&self) -> Option<&str> {
        match self {
            MediaContent::File { content_type, .. } => content_type.as_deref(),
            MediaContent::Payload { content_type, .. } => Some(content_type),
        }
    }
}

/// Remote photo-hosting service
///
/// Each call is a single opaque blocking round trip from the caller's point of
/// view: it either returns a handle-bearing result or fails with a typed error.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::photos::PhotoService;
///
/// async fn count_photos(service: &dyn PhotoService) -> Result<u32> {
///     let albums = service.list_albums().await?;
///     Ok(albums.iter().map(|a| a.num_photos).sum())
/// }
/// ```
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// List every album owned by the authenticated user
    async fn list_albums(&self) -> Result<Vec<RemoteAlbum>>;

    /// List the photos contained in an album
    async fn show_album(&self, album_id: &str) -> Result<Vec<RemotePhoto>>;

    /// Create an album
    async fn create_album(&self, fields: &AlbumFields) -> Result<RemoteAlbum>;

    /// Update an album's title, summary and timestamp
    async fn update_album(&self, album_id: &str, fields: &AlbumFields) -> Result<RemoteAlbum>;

    /// Delete an album together with its photos
    async fn delete_album(&self, album_id: &str) -> Result<()>;

    /// Upload a photo into an album
    async fn create_photo(
        &self,
        album_id: &str,
        fields: &PhotoFields,
        content: MediaContent,
    ) -> Result<RemotePhoto>;

    /// Update a photo's metadata, moving it to `target_album_id` if it differs
    async fn update_photo(
        &self,
        album_id: &str,
        photo_id: &str,
        fields: &PhotoFields,
        target_album_id: &str,
    ) -> Result<RemotePhoto>;

    /// Delete a photo
    async fn delete_photo(&self, album_id: &str, photo_id: &str) -> Result<()>;
}

/// Converts a local file into upload content
///
/// Used only when a photo is created remotely. Implementations may hand back
/// the original file, a substitute file, or an in-memory payload.
#[async_trait]
pub trait ContentTransform: Send + Sync {
    async fn transform(&self, path: &Path) -> Result<MediaContent>;
}
