//! Sync marker embedded in remote album summaries
//!
//! A managed album's summary reads `"<comment> (<token>:<album id>)"`. Albums
//! whose summary carries no marker belong to someone else and are never
//! touched.

use crate::{Result, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMarker {
    token: String,
}

impl SyncMarker {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        core_runtime::config::validate_sync_marker(&token)
            .map_err(|e| SyncError::Config(e.to_string()))?;
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Builds the summary stored on the remote album
    ///
    /// Trailing whitespace in `comment` is dropped, matching [`parse`](Self::parse).
    pub fn render(&self, comment: &str, album_id: &str) -> String {
        let comment = comment.trim_end();
        if comment.is_empty() {
            format!("({}:{})", self.token, album_id)
        } else {
            format!("{} ({}:{})", comment, self.token, album_id)
        }
    }

    /// Splits a remote summary into `(album_id, comment)`
    ///
    /// Returns `None` for unmanaged albums.
    pub fn parse(&self, summary: &str) -> Option<(String, String)> {
        let open = format!("({}:", self.token);
        let start = summary.rfind(&open)?;
        let id_start = start + open.len();
        let id_len = summary[id_start..].rfind(')')?;
        let id = &summary[id_start..id_start + id_len];

        if id.is_empty() {
            return None;
        }

        let comment = summary[..start].trim_end();
        Some((id.to_string(), comment.to_string()))
    }
}

impl Default for SyncMarker {
    fn default() -> Self {
        Self {
            token: core_runtime::config::DEFAULT_SYNC_MARKER.to_string(),
        }
    }
}
