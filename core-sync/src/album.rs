//! # Album Entity
//!
//! Merges the local observation of an album (a directory) with its remote
//! observation (a managed remote album) and decides the next action.
//!
//! ## Decision Rules
//!
//! Rules are evaluated top to bottom; the first matching guard wins:
//!
//! | # | Guard                                              | Action          |
//! |---|----------------------------------------------------|-----------------|
//! | 1 | no local record and no remote record               | `IgnoreDeleted` |
//! | 2 | no local record                                    | `Delete`        |
//! | 3 | no remote record                                   | `Create`        |
//! | 4 | photo list not loaded and local count != remote count | `LoadPhotos` |
//! | 5 | local record != remote record                      | `Sync`          |
//! | 6 | otherwise                                          | `IgnoreSynced`  |

use crate::marker::SyncMarker;
use crate::records::AlbumRecord;
use crate::{Result, SyncError};
use bridge_traits::{AlbumAccess, AlbumFields, PhotoService, RemoteAlbum, RemotePhoto};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Next operation for an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlbumAction {
    IgnoreDeleted,
    Delete,
    Create,
    LoadPhotos,
    Sync,
    IgnoreSynced,
}

impl AlbumAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumAction::IgnoreDeleted => "ignore_deleted",
            AlbumAction::Delete => "delete",
            AlbumAction::Create => "create",
            AlbumAction::LoadPhotos => "load_photos",
            AlbumAction::Sync => "sync",
            AlbumAction::IgnoreSynced => "ignore_synced",
        }
    }

    /// Whether executing the action changes remote state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            AlbumAction::Delete | AlbumAction::Create | AlbumAction::Sync
        )
    }
}

impl fmt::Display for AlbumAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type AlbumGuard = fn(&Album) -> bool;

fn unobserved(album: &Album) -> bool {
    album.local.is_none() && album.remote.is_none()
}

fn directory_gone(album: &Album) -> bool {
    album.local.is_none()
}

fn not_created(album: &Album) -> bool {
    album.remote.is_none()
}

fn photo_counts_disagree(album: &Album) -> bool {
    !album.photo_list_loaded && album.remote_photo_count() != Some(album.local_image_count)
}

fn records_differ(album: &Album) -> bool {
    album.local != album.remote
}

const ALBUM_RULES: &[(AlbumGuard, AlbumAction)] = &[
    (unobserved, AlbumAction::IgnoreDeleted),
    (directory_gone, AlbumAction::Delete),
    (not_created, AlbumAction::Create),
    (photo_counts_disagree, AlbumAction::LoadPhotos),
    (records_differ, AlbumAction::Sync),
];

/// One album, as seen locally and remotely
#[derive(Debug, Clone)]
pub struct Album {
    id: String,
    local: Option<AlbumRecord>,
    directory: Option<PathBuf>,
    remote: Option<AlbumRecord>,
    handle: Option<RemoteAlbum>,
    local_image_count: u32,
    photo_list_loaded: bool,
}

impl Album {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            local: None,
            directory: None,
            remote: None,
            handle: None,
            local_image_count: 0,
            photo_list_loaded: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn local(&self) -> Option<&AlbumRecord> {
        self.local.as_ref()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn remote(&self) -> Option<&AlbumRecord> {
        self.remote.as_ref()
    }

    /// Live remote album, present exactly when a remote record is
    pub fn handle(&self) -> Option<&RemoteAlbum> {
        self.handle.as_ref()
    }

    pub fn local_image_count(&self) -> u32 {
        self.local_image_count
    }

    pub fn photo_list_loaded(&self) -> bool {
        self.photo_list_loaded
    }

    fn remote_photo_count(&self) -> Option<u32> {
        self.handle.as_ref().map(|h| h.num_photos)
    }

    /// Records the local observation
    ///
    /// Trailing whitespace in the comment cannot survive the remote summary,
    /// so it is dropped here.
    pub fn set_local(&mut self, directory: impl Into<PathBuf>, mut record: AlbumRecord) {
        let trimmed = record.comment.trim_end().len();
        record.comment.truncate(trimmed);
        self.directory = Some(directory.into());
        self.local = Some(record);
    }

    pub fn set_remote(&mut self, handle: RemoteAlbum, record: AlbumRecord) {
        self.handle = Some(handle);
        self.remote = Some(record);
    }

    pub fn increment_local_image_count(&mut self) {
        self.local_image_count += 1;
    }

    pub(crate) fn decrement_local_image_count(&mut self) {
        self.local_image_count = self.local_image_count.saturating_sub(1);
    }

    /// Evaluates the decision rules against the current state
    pub fn action(&self) -> AlbumAction {
        ALBUM_RULES
            .iter()
            .find(|(guard, _)| guard(self))
            .map(|(_, action)| *action)
            .unwrap_or(AlbumAction::IgnoreSynced)
    }

    /// Operator-facing description of an action on this album
    pub fn describe(&self, action: AlbumAction) -> String {
        match action {
            AlbumAction::Delete => format!("Deleting album {}", self.id),
            AlbumAction::Create => format!("Creating album {}", self.id),
            AlbumAction::LoadPhotos => format!(
                "Loading photos for album {} (local {}, remote {})",
                self.id,
                self.local_image_count,
                self.remote_photo_count().unwrap_or_default()
            ),
            AlbumAction::Sync => format!(
                "Synching album data {}\n - dir {}\n - web {}",
                self.id,
                display_record(self.local.as_ref()),
                display_record(self.remote.as_ref()),
            ),
            AlbumAction::IgnoreDeleted | AlbumAction::IgnoreSynced => {
                format!("Nothing to do for album {}", self.id)
            }
        }
    }

    fn local_or_missing(&self) -> Result<&AlbumRecord> {
        self.local.as_ref().ok_or_else(|| SyncError::MissingLocalRecord {
            entity: "album",
            id: self.id.clone(),
        })
    }

    fn handle_or_missing(&self) -> Result<&RemoteAlbum> {
        self.handle.as_ref().ok_or_else(|| SyncError::MissingRemoteHandle {
            entity: "album",
            id: self.id.clone(),
        })
    }

    fn fields(&self, marker: &SyncMarker, access: Option<AlbumAccess>) -> Result<AlbumFields> {
        let local = self.local_or_missing()?;
        Ok(AlbumFields {
            title: local.title.clone(),
            summary: marker.render(&local.comment, &self.id),
            timestamp: local.timestamp,
            access,
        })
    }

    /// Creates the album remotely from the local record
    ///
    /// A fresh album has no photos, so its photo list counts as loaded.
    #[instrument(skip(self, client, marker), fields(album_id = %self.id))]
    pub async fn create(&mut self, client: &dyn PhotoService, marker: &SyncMarker) -> Result<()> {
        let fields = self.fields(marker, Some(AlbumAccess::Private))?;
        let handle = client.create_album(&fields).await?;
        debug!(remote_id = %handle.id, "Album created");

        self.remote = self.local.clone();
        self.handle = Some(handle);
        self.photo_list_loaded = true;
        Ok(())
    }

    /// Pushes the local record onto the existing remote album
    #[instrument(skip(self, client, marker), fields(album_id = %self.id))]
    pub async fn sync(&mut self, client: &dyn PhotoService, marker: &SyncMarker) -> Result<()> {
        let fields = self.fields(marker, None)?;
        let remote_id = self.handle_or_missing()?.id.clone();
        let handle = client.update_album(&remote_id, &fields).await?;

        self.remote = self.local.clone();
        self.handle = Some(handle);
        Ok(())
    }

    #[instrument(skip(self, client), fields(album_id = %self.id))]
    pub async fn delete(&mut self, client: &dyn PhotoService) -> Result<()> {
        let remote_id = self.handle_or_missing()?.id.clone();
        client.delete_album(&remote_id).await?;

        self.remote = None;
        self.handle = None;
        Ok(())
    }

    /// Fetches the remote photo list and marks it loaded
    ///
    /// The caller feeds the returned photos to the image registry.
    #[instrument(skip(self, client), fields(album_id = %self.id))]
    pub async fn load_photos(&mut self, client: &dyn PhotoService) -> Result<Vec<RemotePhoto>> {
        let remote_id = self.handle_or_missing()?.id.clone();
        let photos = client.show_album(&remote_id).await?;
        debug!(count = photos.len(), "Loaded remote photo list");

        self.photo_list_loaded = true;
        Ok(photos)
    }
}

fn display_record(record: Option<&AlbumRecord>) -> String {
    record
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// Albums keyed by id, materialised on first observation
#[derive(Debug, Clone, Default)]
pub struct AlbumRegistry {
    albums: BTreeMap<String, Album>,
}

impl AlbumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut Album {
        self.albums
            .entry(id.to_string())
            .or_insert_with(|| Album::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&Album> {
        self.albums.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Album> {
        self.albums.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.albums.contains_key(id)
    }

    /// Snapshot of the ids in iteration order
    pub fn ids(&self) -> Vec<String> {
        self.albums.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Album> {
        self.albums.values()
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }
}
