//! # Metadata Context
//!
//! Everything a rule may ask about one directory or file. Each source is read
//! at most once per context, and only when a rule asks for it:
//! - `stat` (size, modification time) through [`FileSystemAccess::metadata`]
//! - extended attributes through [`FileSystemAccess::read_xattr`]
//! - EXIF fields, parsed with `kamadak-exif` on the blocking pool
//!
//! ## Usage
//!
//! ```ignore
//! let ctx = MetadataContext::new(fs.clone(), "/photos/Trip/IMG1.jpg");
//! let caption = match ctx.exif().await {
//!     Some(exif) => exif.image_description.clone(),
//!     None => ctx.xattr("user.caption").await,
//! };
//! ```

use crate::content_type::{carries_exif, content_type_for};
use crate::error::{MetadataError, Result};
use bridge_traits::{FileMetadata, FileSystemAccess};
use bytes::Bytes;
use chrono::{NaiveDateTime, TimeZone, Utc};
use exif::{Context, In, Tag, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// EXIF fields used by the observation rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifFields {
    pub document_name: Option<String>,
    pub image_description: Option<String>,
    pub user_comment: Option<String>,
    /// `DateTimeOriginal` as epoch seconds, read as UTC
    pub date_time_original: Option<i64>,
}

/// Lazily evaluated view of one path
pub struct MetadataContext {
    path: PathBuf,
    content_type: Option<&'static str>,
    fs: Arc<dyn FileSystemAccess>,
    metadata: OnceCell<FileMetadata>,
    xattrs: Mutex<HashMap<String, Option<String>>>,
    exif: OnceCell<Option<ExifFields>>,
}

impl MetadataContext {
    pub fn new(fs: Arc<dyn FileSystemAccess>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            content_type: content_type_for(&path),
            path,
            fs,
            metadata: OnceCell::new(),
            xattrs: Mutex::new(HashMap::new()),
            exif: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File or directory name, including any extension
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its final extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    pub async fn metadata(&self) -> Result<&FileMetadata> {
        self.metadata
            .get_or_try_init(|| async {
                self.fs
                    .metadata(&self.path)
                    .await
                    .map_err(MetadataError::from)
            })
            .await
    }

    pub async fn size(&self) -> Result<u64> {
        Ok(self.metadata().await?.size)
    }

    /// Modification time in epoch seconds; 0 when the platform has none
    pub async fn mtime(&self) -> Result<i64> {
        Ok(self.metadata().await?.modified_at.unwrap_or_default())
    }

    /// Extended attribute value, `None` when unset or unreadable
    pub async fn xattr(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.xattrs.lock().await.get(name) {
            return cached.clone();
        }

        let value = match self.fs.read_xattr(&self.path, name).await {
            Ok(value) => value.and_then(|v| non_empty(&v)),
            Err(e) => {
                debug!(path = ?self.path, name, error = %e, "Cannot read extended attribute");
                None
            }
        };

        self.xattrs
            .lock()
            .await
            .insert(name.to_string(), value.clone());
        value
    }

    /// EXIF fields for JPEG and TIFF files; `None` for other types or when
    /// the file carries no EXIF block
    pub async fn exif(&self) -> Option<&ExifFields> {
        self.exif
            .get_or_init(|| async { self.read_exif().await })
            .await
            .as_ref()
    }

    async fn read_exif(&self) -> Option<ExifFields> {
        if !self.content_type.is_some_and(carries_exif) {
            return None;
        }

        let data = match self.fs.read_file(&self.path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Cannot read file for EXIF");
                return None;
            }
        };

        let parsed = tokio::task::spawn_blocking(move || parse_exif(data))
            .await
            .map_err(|e| MetadataError::ExtractionFailed(format!("EXIF task failed: {}", e)))
            .and_then(|result| result);

        match parsed {
            Ok(fields) => fields,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Ignoring unreadable EXIF data");
                None
            }
        }
    }
}

impl fmt::Debug for MetadataContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataContext")
            .field("path", &self.path)
            .field("content_type", &self.content_type)
            .finish()
    }
}

// ============================================================================
// EXIF parsing
// ============================================================================

/// Parses the EXIF block of a JPEG or TIFF image
///
/// Files without EXIF data yield `Ok(None)`.
pub(crate) fn parse_exif(data: Bytes) -> Result<Option<ExifFields>> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(
            exif::Error::NotFound(_) | exif::Error::NotSupported(_) | exif::Error::BlankValue(_),
        ) => return Ok(None),
        Err(e) => return Err(MetadataError::Exif(e.to_string())),
    };

    let text = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| match &field.value {
                Value::Ascii(values) => values
                    .first()
                    .and_then(|bytes| non_empty(&String::from_utf8_lossy(bytes))),
                _ => None,
            })
    };

    let user_comment = exif
        .get_field(Tag::UserComment, In::PRIMARY)
        .and_then(|field| match &field.value {
            // First eight bytes name the character code
            Value::Undefined(bytes, _) if bytes.len() > 8 => {
                non_empty(&String::from_utf8_lossy(&bytes[8..]))
            }
            _ => None,
        });

    let date_time_original = text(Tag::DateTimeOriginal).and_then(|value| {
        match NaiveDateTime::parse_from_str(&value, EXIF_DATE_FORMAT) {
            Ok(naive) => Some(Utc.from_utc_datetime(&naive).timestamp()),
            Err(e) => {
                debug!(value = %value, error = %e, "Ignoring malformed DateTimeOriginal");
                None
            }
        }
    });

    Ok(Some(ExifFields {
        document_name: text(Tag(Context::Tiff, 0x10d)),
        image_description: text(Tag::ImageDescription),
        user_comment,
        date_time_original,
    }))
}

/// Trims whitespace and NUL padding; empty strings become `None`
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
