//! File System Abstractions
//!
//! Provides the platform-agnostic file access trait used by the local scanner
//! and by the image cache store.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file I/O so the reconciliation core never touches the disk
/// directly:
/// - Desktop: tokio filesystem with extended attribute support
/// - Tests: temporary directories or in-memory fakes
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn persist(fs: &dyn FileSystemAccess, path: &Path, data: &[u8]) -> Result<()> {
///     fs.write_file(path, Bytes::copy_from_slice(data)).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it (and its parent directory) if needed
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read a user extended attribute as UTF-8 text
    ///
    /// Returns `Ok(None)` when the attribute is absent or the platform does
    /// not support extended attributes.
    async fn read_xattr(&self, path: &Path, name: &str) -> Result<Option<String>>;
}
