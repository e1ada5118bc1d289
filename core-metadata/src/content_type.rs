//! Content type detection by file extension, and matchers used to select
//! which file rules apply to a file.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

static CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("jpe", "image/jpeg"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("webp", "image/webp"),
        ("heic", "image/heic"),
        ("mp4", "video/mp4"),
        ("m4v", "video/x-m4v"),
        ("mov", "video/quicktime"),
        ("avi", "video/x-msvideo"),
        ("mkv", "video/x-matroska"),
        ("3gp", "video/3gpp"),
        ("mpg", "video/mpeg"),
        ("mpeg", "video/mpeg"),
        ("wmv", "video/x-ms-wmv"),
    ])
});

/// Content type for `path`, judged by its extension (case-insensitive)
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    CONTENT_TYPES.get(extension.as_str()).copied()
}

/// Whether EXIF data can be read from files of this content type
pub fn carries_exif(content_type: &str) -> bool {
    matches!(content_type, "image/jpeg" | "image/tiff")
}

/// Selects files by content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeMatcher {
    /// Every file, including ones with an unknown type
    Any,
    /// Exactly this content type
    Exact(String),
    /// Content types starting with this prefix, e.g. `image/`
    Prefix(String),
}

impl ContentTypeMatcher {
    pub fn images() -> Self {
        ContentTypeMatcher::Prefix("image/".to_string())
    }

    pub fn videos() -> Self {
        ContentTypeMatcher::Prefix("video/".to_string())
    }

    pub fn exact(content_type: impl Into<String>) -> Self {
        ContentTypeMatcher::Exact(content_type.into())
    }

    pub fn matches(&self, content_type: Option<&str>) -> bool {
        match (self, content_type) {
            (ContentTypeMatcher::Any, _) => true,
            (ContentTypeMatcher::Exact(expected), Some(actual)) => expected == actual,
            (ContentTypeMatcher::Prefix(prefix), Some(actual)) => actual.starts_with(prefix.as_str()),
            (_, None) => false,
        }
    }
}
