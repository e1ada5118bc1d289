//! # Observation Records
//!
//! Value records produced by local and remote observation. Records carry no
//! identity of their own; the entity that holds them compares local against
//! remote by plain structural equality.

use bridge_traits::RemotePhoto;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Album fields compared between the local directory and the remote album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub title: String,
    /// Epoch seconds
    pub timestamp: i64,
    pub comment: String,
}

impl AlbumRecord {
    pub fn new(title: impl Into<String>, timestamp: i64, comment: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            timestamp,
            comment: comment.into(),
        }
    }
}

impl fmt::Display for AlbumRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "title={:?} timestamp={} comment={:?}",
            self.title, self.timestamp, self.comment
        )
    }
}

/// Sorted, de-duplicated, case-sensitive keyword set
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keywords(BTreeSet<String>);

impl Keywords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated keyword list
    ///
    /// Whitespace around each keyword is dropped, as are empty entries.
    ///
    /// ```
    /// use core_sync::records::Keywords;
    ///
    /// let keywords = Keywords::parse("b, a, a");
    /// assert_eq!(keywords.to_vec(), vec!["a", "b"]);
    /// ```
    pub fn parse(value: &str) -> Self {
        value.split(',').collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Comma separated form sent to the remote service
    pub fn join(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }
}

impl<S: AsRef<str>> FromIterator<S> for Keywords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|k| k.as_ref().trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for Keywords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

/// Image fields compared between the local file and the remote photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Id of the owning album; resolved through the album registry
    pub album_id: String,
    /// Epoch seconds
    pub timestamp: i64,
    pub caption: String,
    pub keywords: Keywords,
}

impl ImageRecord {
    pub fn new(
        album_id: impl Into<String>,
        timestamp: i64,
        caption: impl Into<String>,
        keywords: Keywords,
    ) -> Self {
        Self {
            album_id: album_id.into(),
            timestamp,
            caption: caption.into(),
            keywords,
        }
    }

    /// Maps a remote photo listed under album `album_id` to its record
    pub fn from_remote(album_id: &str, photo: &RemotePhoto) -> Self {
        Self {
            album_id: album_id.to_string(),
            timestamp: photo.timestamp,
            caption: photo.summary.clone(),
            keywords: photo
                .keywords
                .as_deref()
                .map(Keywords::parse)
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "album={} timestamp={} caption={:?} keywords=[{}]",
            self.album_id, self.timestamp, self.caption, self.keywords
        )
    }
}
