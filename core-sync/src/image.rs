//! # Image Entity
//!
//! Merges the local observation of an image (a file) with its remote
//! observation, which is either live (listed this run, with a photo handle) or
//! restored from the cache (believed to exist, not yet reconfirmed).
//!
//! An image never points at its album directly: `ImageRecord::album_id` is
//! looked up in the [`AlbumRegistry`] on every evaluation, so album mutations
//! made earlier in the run are always visible.
//!
//! ## Normalisation
//!
//! Before the rules run, the remote observation is dropped when:
//! - it came from the cache and its album's photo list has since been loaded
//!   without listing it
//! - its album has no remote handle (never created, or deleted)
//!
//! ## Decision Rules
//!
//! | # | Guard                                                  | Action            |
//! |---|--------------------------------------------------------|-------------------|
//! | 1 | no local record and no remote record                   | `IgnoreDeleted`   |
//! | 2 | local record equals remote record                      | `IgnoreSynced`    |
//! | 3 | local album has no remote handle                       | `WaitAlbumCreate` |
//! | 4 | remote or local album photo list not loaded            | `LoadPhotos`      |
//! | 5 | no local record                                        | `Delete`          |
//! | 6 | no live photo handle                                   | `Create`          |
//! | 7 | otherwise                                              | `Sync`            |

use crate::album::AlbumRegistry;
use crate::records::ImageRecord;
use crate::{Result, SyncError};
use bridge_traits::{ContentTransform, PhotoFields, PhotoService, RemotePhoto};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Next operation for an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageAction {
    IgnoreDeleted,
    IgnoreSynced,
    WaitAlbumCreate,
    LoadPhotos,
    Delete,
    Create,
    Sync,
}

impl ImageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageAction::IgnoreDeleted => "ignore_deleted",
            ImageAction::IgnoreSynced => "ignore_synced",
            ImageAction::WaitAlbumCreate => "wait_album_create",
            ImageAction::LoadPhotos => "load_photos",
            ImageAction::Delete => "delete",
            ImageAction::Create => "create",
            ImageAction::Sync => "sync",
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ImageAction::Delete | ImageAction::Create | ImageAction::Sync
        )
    }
}

impl fmt::Display for ImageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ImageGuard = fn(&Image, &AlbumRegistry) -> bool;

fn unobserved(image: &Image, _albums: &AlbumRegistry) -> bool {
    image.local.is_none() && image.remote.is_none()
}

fn in_sync(image: &Image, _albums: &AlbumRegistry) -> bool {
    image.local.is_some() && image.local == image.remote
}

fn album_not_created(image: &Image, albums: &AlbumRegistry) -> bool {
    image
        .local
        .as_ref()
        .is_some_and(|local| !album_has_handle(albums, &local.album_id))
}

fn photo_list_pending(image: &Image, albums: &AlbumRegistry) -> bool {
    image.related_album_ids().any(|album_id| {
        albums
            .get(album_id)
            .is_some_and(|album| !album.photo_list_loaded())
    })
}

fn file_gone(image: &Image, _albums: &AlbumRegistry) -> bool {
    image.local.is_none()
}

fn not_uploaded(image: &Image, _albums: &AlbumRegistry) -> bool {
    image.photo.is_none()
}

const IMAGE_RULES: &[(ImageGuard, ImageAction)] = &[
    (unobserved, ImageAction::IgnoreDeleted),
    (in_sync, ImageAction::IgnoreSynced),
    (album_not_created, ImageAction::WaitAlbumCreate),
    (photo_list_pending, ImageAction::LoadPhotos),
    (file_gone, ImageAction::Delete),
    (not_uploaded, ImageAction::Create),
];

fn album_has_handle(albums: &AlbumRegistry, album_id: &str) -> bool {
    albums
        .get(album_id)
        .is_some_and(|album| album.handle().is_some())
}

/// One image, as seen locally and remotely
#[derive(Debug, Clone)]
pub struct Image {
    id: String,
    local: Option<ImageRecord>,
    file: Option<PathBuf>,
    remote: Option<ImageRecord>,
    photo: Option<RemotePhoto>,
}

impl Image {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            local: None,
            file: None,
            remote: None,
            photo: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn local(&self) -> Option<&ImageRecord> {
        self.local.as_ref()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn remote(&self) -> Option<&ImageRecord> {
        self.remote.as_ref()
    }

    pub fn photo(&self) -> Option<&RemotePhoto> {
        self.photo.as_ref()
    }

    /// Remote record restored from the cache and not reconfirmed this run
    pub fn is_cached(&self) -> bool {
        self.remote.is_some() && self.photo.is_none()
    }

    pub fn set_local(&mut self, file: impl Into<PathBuf>, record: ImageRecord) {
        self.file = Some(file.into());
        self.local = Some(record);
    }

    pub fn set_remote(&mut self, photo: RemotePhoto, record: ImageRecord) {
        self.photo = Some(photo);
        self.remote = Some(record);
    }

    /// Seeds a remote record from the cache; live observations win
    pub fn set_cached(&mut self, record: ImageRecord) -> bool {
        if self.photo.is_some() {
            return false;
        }
        self.remote = Some(record);
        true
    }

    pub fn clear_remote(&mut self) {
        self.remote = None;
        self.photo = None;
    }

    fn related_album_ids(&self) -> impl Iterator<Item = &str> {
        self.remote
            .iter()
            .chain(self.local.iter())
            .map(|record| record.album_id.as_str())
    }

    /// Drops remote observations that can no longer be true
    pub fn normalize(&mut self, albums: &AlbumRegistry) {
        let Some(remote) = self.remote.as_ref() else {
            return;
        };

        let stale = match albums.get(&remote.album_id) {
            None => true,
            Some(album) => {
                album.handle().is_none() || (self.photo.is_none() && album.photo_list_loaded())
            }
        };

        if stale {
            debug!(image_id = %self.id, album_id = %remote.album_id, "Dropping stale remote observation");
            self.clear_remote();
        }
    }

    /// Normalises, then evaluates the decision rules
    pub fn action(&mut self, albums: &AlbumRegistry) -> ImageAction {
        self.normalize(albums);
        IMAGE_RULES
            .iter()
            .find(|(guard, _)| guard(self, albums))
            .map(|(_, action)| *action)
            .unwrap_or(ImageAction::Sync)
    }

    /// Albums whose photo lists must be fetched before this image can be decided
    pub fn albums_to_load(&self, albums: &AlbumRegistry) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for album_id in self.related_album_ids() {
            let pending = albums
                .get(album_id)
                .is_some_and(|album| !album.photo_list_loaded() && album.handle().is_some());
            if pending && !ids.iter().any(|id| id == album_id) {
                ids.push(album_id.to_string());
            }
        }
        ids
    }

    pub fn describe(&self, action: ImageAction, albums: &AlbumRegistry) -> String {
        let album_title = |record: Option<&ImageRecord>| {
            record
                .and_then(|r| albums.get(&r.album_id))
                .and_then(|album| album.local().or(album.remote()))
                .map(|r| r.title.clone())
                .unwrap_or_else(|| "?".to_string())
        };

        match action {
            ImageAction::Delete => format!(
                "Deleting image {} from {}",
                self.id,
                album_title(self.remote.as_ref())
            ),
            ImageAction::Create => format!(
                "Creating image {} in {}",
                self.id,
                album_title(self.local.as_ref())
            ),
            ImageAction::Sync => format!(
                "Synchronising image {}\n - file {}\n - web  {}",
                self.id,
                display_record(self.local.as_ref()),
                display_record(self.remote.as_ref()),
            ),
            ImageAction::LoadPhotos => format!("Loading photos to locate image {}", self.id),
            ImageAction::WaitAlbumCreate => {
                format!("Image {} waits for its album to be created", self.id)
            }
            ImageAction::IgnoreDeleted | ImageAction::IgnoreSynced => {
                format!("Nothing to do for image {}", self.id)
            }
        }
    }

    fn local_or_missing(&self) -> Result<&ImageRecord> {
        self.local.as_ref().ok_or_else(|| SyncError::MissingLocalRecord {
            entity: "image",
            id: self.id.clone(),
        })
    }

    fn photo_or_missing(&self) -> Result<&RemotePhoto> {
        self.photo.as_ref().ok_or_else(|| SyncError::MissingRemoteHandle {
            entity: "image",
            id: self.id.clone(),
        })
    }

    fn target_album<'a>(&self, albums: &'a AlbumRegistry) -> Result<&'a str> {
        let local = self.local_or_missing()?;
        albums
            .get(&local.album_id)
            .and_then(|album| album.handle())
            .map(|handle| handle.id.as_str())
            .ok_or_else(|| SyncError::MissingRemoteHandle {
                entity: "album",
                id: local.album_id.clone(),
            })
    }

    fn fields(&self) -> Result<PhotoFields> {
        let local = self.local_or_missing()?;
        Ok(PhotoFields {
            title: self.id.clone(),
            summary: local.caption.clone(),
            keywords: local.keywords.join(),
            timestamp: local.timestamp,
        })
    }

    /// Uploads the local file into the remote album of its local record
    #[instrument(skip(self, client, transform, albums), fields(image_id = %self.id))]
    pub async fn create(
        &mut self,
        client: &dyn PhotoService,
        transform: &dyn ContentTransform,
        albums: &AlbumRegistry,
    ) -> Result<()> {
        let fields = self.fields()?;
        let target = self.target_album(albums)?;
        let file = self.file.as_deref().ok_or_else(|| SyncError::MissingLocalRecord {
            entity: "image",
            id: self.id.clone(),
        })?;

        let content = transform.transform(file).await?;
        let photo = client.create_photo(target, &fields, content).await?;
        debug!(photo_id = %photo.id, "Photo uploaded");

        self.remote = self.local.clone();
        self.photo = Some(photo);
        Ok(())
    }

    /// Updates the remote photo, moving it when the local album changed
    #[instrument(skip(self, client, albums), fields(image_id = %self.id))]
    pub async fn sync(&mut self, client: &dyn PhotoService, albums: &AlbumRegistry) -> Result<()> {
        let fields = self.fields()?;
        let target = self.target_album(albums)?;
        let photo = self.photo_or_missing()?;

        let updated = client
            .update_photo(&photo.album_id, &photo.id, &fields, target)
            .await?;

        self.remote = self.local.clone();
        self.photo = Some(updated);
        Ok(())
    }

    #[instrument(skip(self, client), fields(image_id = %self.id))]
    pub async fn delete(&mut self, client: &dyn PhotoService) -> Result<()> {
        let photo = self.photo_or_missing()?;
        client.delete_photo(&photo.album_id, &photo.id).await?;

        self.clear_remote();
        Ok(())
    }
}

fn display_record(record: Option<&ImageRecord>) -> String {
    record
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// Images keyed by id across every album
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    images: BTreeMap<String, Image>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut Image {
        self.images
            .entry(id.to_string())
            .or_insert_with(|| Image::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&Image> {
        self.images.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Image> {
        self.images.get_mut(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.images.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image> {
        self.images.values()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
