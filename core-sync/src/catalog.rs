//! # Sync Catalog
//!
//! Owns the album and image registries for one run and routes observations
//! into them. The catalog is an ordinary value: it is built by discovery,
//! handed to the coordinator by `&mut`, and dropped at the end of the run.

use crate::album::{Album, AlbumAction, AlbumRegistry};
use crate::image::{Image, ImageAction, ImageRegistry};
use crate::records::{AlbumRecord, ImageRecord};
use crate::{Result, SyncError};
use bridge_traits::{PhotoService, RemoteAlbum, RemotePhoto};
use core_runtime::config::DuplicateIdPolicy;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SyncCatalog {
    albums: AlbumRegistry,
    images: ImageRegistry,
    duplicate_ids: DuplicateIdPolicy,
}

impl SyncCatalog {
    pub fn new(duplicate_ids: DuplicateIdPolicy) -> Self {
        Self {
            albums: AlbumRegistry::new(),
            images: ImageRegistry::new(),
            duplicate_ids,
        }
    }

    pub fn albums(&self) -> &AlbumRegistry {
        &self.albums
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    pub fn album(&self, id: &str) -> Option<&Album> {
        self.albums.get(id)
    }

    pub fn image(&self, id: &str) -> Option<&Image> {
        self.images.get(id)
    }

    pub fn observe_local_album(
        &mut self,
        id: &str,
        directory: impl Into<PathBuf>,
        record: AlbumRecord,
    ) {
        self.albums.get_or_create(id).set_local(directory, record);
    }

    /// Registers a local file
    ///
    /// # Errors
    ///
    /// - [`SyncError::UnknownAlbum`] when the record's album was never observed
    /// - [`SyncError::DuplicateImageId`] when the id was already observed
    ///   locally and the policy is [`DuplicateIdPolicy::Reject`]
    pub fn observe_local_image(
        &mut self,
        id: &str,
        file: impl Into<PathBuf>,
        record: ImageRecord,
    ) -> Result<()> {
        if !self.albums.contains(&record.album_id) {
            return Err(SyncError::UnknownAlbum {
                image_id: id.to_string(),
                album_id: record.album_id.clone(),
            });
        }

        let previous_album = self
            .images
            .get(id)
            .and_then(|image| image.local())
            .map(|local| local.album_id.clone());

        if let Some(first_album) = previous_album {
            match self.duplicate_ids {
                DuplicateIdPolicy::Reject => {
                    return Err(SyncError::DuplicateImageId {
                        image_id: id.to_string(),
                        first_album,
                        second_album: record.album_id.clone(),
                    });
                }
                DuplicateIdPolicy::Overwrite => {
                    warn!(
                        image_id = %id,
                        first_album = %first_album,
                        second_album = %record.album_id,
                        "Image id observed twice, keeping the later file"
                    );
                    if let Some(album) = self.albums.get_mut(&first_album) {
                        album.decrement_local_image_count();
                    }
                }
            }
        }

        self.albums
            .get_or_create(&record.album_id)
            .increment_local_image_count();
        self.images.get_or_create(id).set_local(file, record);
        Ok(())
    }

    pub fn observe_remote_album(&mut self, id: &str, handle: RemoteAlbum, record: AlbumRecord) {
        self.albums.get_or_create(id).set_remote(handle, record);
    }

    /// Registers a photo listed under album `album_id`; its title is the image id
    pub fn observe_remote_photo(&mut self, album_id: &str, photo: RemotePhoto) {
        let record = ImageRecord::from_remote(album_id, &photo);
        let id = photo.title.clone();
        self.images.get_or_create(&id).set_remote(photo, record);
    }

    /// Seeds remote records from a previous run
    ///
    /// Entries whose album is unknown this run are dropped. Returns the
    /// number of entries applied.
    pub fn restore_cached(&mut self, entries: BTreeMap<String, ImageRecord>) -> usize {
        let mut restored = 0;
        for (id, record) in entries {
            if !self.albums.contains(&record.album_id) {
                debug!(image_id = %id, album_id = %record.album_id, "Dropping orphaned cache entry");
                continue;
            }
            if self.images.get_or_create(&id).set_cached(record) {
                restored += 1;
            }
        }
        restored
    }

    /// Current remote records keyed by image id, as persisted in the cache
    pub fn cache_entries(&self) -> BTreeMap<String, ImageRecord> {
        self.images
            .iter()
            .filter_map(|image| {
                image
                    .remote()
                    .map(|record| (image.id().to_string(), record.clone()))
            })
            .collect()
    }

    pub fn album_action(&self, album_id: &str) -> Option<AlbumAction> {
        self.albums.get(album_id).map(Album::action)
    }

    /// Normalises the image against the current album state and decides
    pub fn image_action(&mut self, image_id: &str) -> Option<ImageAction> {
        let albums = &self.albums;
        self.images
            .get_mut(image_id)
            .map(|image| image.action(albums))
    }

    /// Applies normalisation to every image
    pub fn normalize_images(&mut self) {
        let albums = &self.albums;
        for id in self.images.ids() {
            if let Some(image) = self.images.get_mut(&id) {
                image.normalize(albums);
            }
        }
    }

    /// Album `load_photos`: fetches the photo list and observes every photo
    pub async fn load_album_photos(
        &mut self,
        album_id: &str,
        client: &dyn PhotoService,
    ) -> Result<usize> {
        let album = self
            .albums
            .get_mut(album_id)
            .ok_or_else(|| SyncError::MissingRemoteHandle {
                entity: "album",
                id: album_id.to_string(),
            })?;

        let photos = album.load_photos(client).await?;
        let count = photos.len();
        for photo in photos {
            self.observe_remote_photo(album_id, photo);
        }
        Ok(count)
    }

    /// Image `load_photos`: loads every album the image's decision waits on
    pub async fn load_image_photos(
        &mut self,
        image_id: &str,
        client: &dyn PhotoService,
    ) -> Result<usize> {
        let album_ids = self
            .images
            .get(image_id)
            .map(|image| image.albums_to_load(&self.albums))
            .unwrap_or_default();

        let mut count = 0;
        for album_id in album_ids {
            count += self.load_album_photos(&album_id, client).await?;
        }
        Ok(count)
    }

    /// Splits the catalog so an image can be mutated while albums are read
    pub(crate) fn image_and_albums(
        &mut self,
        image_id: &str,
    ) -> Option<(&mut Image, &AlbumRegistry)> {
        let albums = &self.albums;
        self.images.get_mut(image_id).map(|image| (image, albums))
    }

    pub(crate) fn album_mut(&mut self, album_id: &str) -> Option<&mut Album> {
        self.albums.get_mut(album_id)
    }
}
