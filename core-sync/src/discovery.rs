//! # Discovery
//!
//! Populates a [`SyncCatalog`] before reconciliation:
//! 1. Local scan: every visible sub-directory of the library root is offered
//!    to the [`LocalObservationSource`] as an album, every visible file inside
//!    it as an image.
//! 2. Remote listing: every remote album whose summary carries the sync
//!    marker is observed; the rest are left alone.
//!
//! Photo lists are not fetched here. They are loaded lazily by the
//! coordinator when an album's counts disagree.

use crate::catalog::SyncCatalog;
use crate::marker::SyncMarker;
use crate::records::{AlbumRecord, ImageRecord};
use crate::Result;
use async_trait::async_trait;
use bridge_traits::{FileSystemAccess, PhotoService};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Turns directories and files into album and image observations
///
/// Returning `Ok(None)` means "not managed, skip it". Errors are logged by the
/// scanner and the entity is treated as not observed.
#[async_trait]
pub trait LocalObservationSource: Send + Sync {
    async fn observe_directory(&self, directory: &Path) -> Result<Option<(String, AlbumRecord)>>;

    async fn observe_file(
        &self,
        album_id: &str,
        file: &Path,
    ) -> Result<Option<(String, ImageRecord)>>;
}

/// Counts produced by a discovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub local_albums: usize,
    pub local_images: usize,
    pub remote_albums: usize,
    pub unmanaged_albums: usize,
    pub cached_images: usize,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(true)
}

/// Scans the library root into the catalog
///
/// # Errors
///
/// Fails when the root cannot be listed, or when an observation breaks a
/// catalog invariant (unknown album, rejected duplicate id).
#[instrument(skip(catalog, source, fs), fields(root = ?root))]
pub async fn scan_local(
    catalog: &mut SyncCatalog,
    source: &dyn LocalObservationSource,
    fs: &dyn FileSystemAccess,
    root: &Path,
    stats: &mut DiscoveryStats,
) -> Result<()> {
    for directory in fs.list_directory(root).await? {
        if is_hidden(&directory) {
            continue;
        }

        match fs.metadata(&directory).await {
            Ok(metadata) if metadata.is_directory => {}
            Ok(_) => continue,
            Err(e) => {
                warn!(path = ?directory, error = %e, "Cannot stat library entry, skipping");
                continue;
            }
        }

        let (album_id, record) = match source.observe_directory(&directory).await {
            Ok(Some(observed)) => observed,
            Ok(None) => {
                debug!(path = ?directory, "Directory not managed");
                continue;
            }
            Err(e) => {
                warn!(path = ?directory, error = %e, "Cannot observe directory, skipping");
                continue;
            }
        };

        debug!(album_id = %album_id, path = ?directory, "Found album");
        catalog.observe_local_album(&album_id, &directory, record);
        stats.local_albums += 1;

        scan_album_files(catalog, source, fs, &album_id, &directory, stats).await?;
    }

    Ok(())
}

async fn scan_album_files(
    catalog: &mut SyncCatalog,
    source: &dyn LocalObservationSource,
    fs: &dyn FileSystemAccess,
    album_id: &str,
    directory: &Path,
    stats: &mut DiscoveryStats,
) -> Result<()> {
    let files = match fs.list_directory(directory).await {
        Ok(files) => files,
        Err(e) => {
            warn!(album_id = %album_id, error = %e, "Cannot list album directory");
            return Ok(());
        }
    };

    for file in files {
        if is_hidden(&file) {
            continue;
        }

        match fs.metadata(&file).await {
            Ok(metadata) if !metadata.is_directory => {}
            Ok(_) => continue,
            Err(e) => {
                warn!(path = ?file, error = %e, "Cannot stat file, skipping");
                continue;
            }
        }

        match source.observe_file(album_id, &file).await {
            Ok(Some((image_id, record))) => {
                catalog.observe_local_image(&image_id, &file, record)?;
                stats.local_images += 1;
            }
            Ok(None) => debug!(path = ?file, "File skipped"),
            Err(e) => warn!(path = ?file, error = %e, "Cannot observe file, skipping"),
        }
    }

    Ok(())
}

/// Observes every managed remote album
#[instrument(skip(catalog, client, marker))]
pub async fn scan_remote(
    catalog: &mut SyncCatalog,
    client: &dyn PhotoService,
    marker: &SyncMarker,
    stats: &mut DiscoveryStats,
) -> Result<()> {
    for remote in client.list_albums().await? {
        let Some((album_id, comment)) = marker.parse(&remote.summary) else {
            debug!(title = %remote.title, "Skipping unmanaged remote album");
            stats.unmanaged_albums += 1;
            continue;
        };

        if catalog
            .album(&album_id)
            .is_some_and(|album| album.handle().is_some())
        {
            warn!(album_id = %album_id, remote_id = %remote.id, "Album id claimed by several remote albums, keeping the last");
        }

        let record = AlbumRecord::new(remote.title.clone(), remote.timestamp, comment);
        debug!(album_id = %album_id, remote_id = %remote.id, "Found remote album");
        catalog.observe_remote_album(&album_id, remote, record);
        stats.remote_albums += 1;
    }

    info!(
        managed = stats.remote_albums,
        unmanaged = stats.unmanaged_albums,
        "Listed remote albums"
    );
    Ok(())
}
