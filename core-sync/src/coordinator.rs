//! # Sync Coordinator
//!
//! Drives one reconciliation run between the local library and the remote
//! photo service.
//!
//! ## Overview
//!
//! The `SyncCoordinator` discovers local and remote state into a
//! [`SyncCatalog`], then applies actions in a fixed phase order so that album
//! creation precedes photo placement and photo removal precedes album removal.
//!
//! ## Workflow
//!
//! ### Discovery
//! 1. Scan the library root through the `LocalObservationSource`
//! 2. List remote albums and keep those carrying the sync marker
//! 3. Restore cached remote image records
//!
//! ### Reconciliation
//! 1. Album `load_photos`
//! 2. Image `load_photos`
//! 3. Persist the image cache
//! 4. Album `create` / `sync`
//! 5. Image `create` / `sync`
//! 6. Album `delete`
//! 7. Image `delete`
//! 8. Persist the image cache again
//!
//! Each action is decided immediately before it is applied. A failing item is
//! logged and recorded in the [`SyncReport`]; the phase carries on.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{ImageCache, SyncConfig, SyncCoordinator};
//! use std::sync::Arc;
//!
//! let cache = ImageCache::new(fs.clone(), Some(cache_path));
//! let coordinator = SyncCoordinator::new(SyncConfig::default(), client, transform, cache);
//!
//! let report = coordinator.run(&source, fs.as_ref(), &library_root).await?;
//! println!("{} actions executed, {} failed", report.executed(), report.failed());
//! ```

use crate::{
    album::AlbumAction,
    cache::ImageCache,
    catalog::SyncCatalog,
    discovery::{scan_local, scan_remote, DiscoveryStats, LocalObservationSource},
    image::ImageAction,
    marker::SyncMarker,
    report::{ActionOutcome, EntityKind, OutcomeStatus, SyncReport, SyncRunId},
    Result, SyncError,
};
use bridge_traits::{Confirmation, ContentTransform, FileSystemAccess, PhotoService};
use core_runtime::config::{CoreConfig, DuplicateIdPolicy, ExecutionMode};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Sync coordinator configuration
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// How mutating actions are carried out
    pub mode: ExecutionMode,

    /// Marker identifying managed remote albums
    pub marker: SyncMarker,

    /// Handling of local image id collisions
    pub duplicate_ids: DuplicateIdPolicy,
}

impl SyncConfig {
    /// Derives the coordinator settings from a validated core configuration
    pub fn from_core(config: &CoreConfig) -> Result<Self> {
        Ok(Self {
            mode: config.execution_mode,
            marker: SyncMarker::new(config.sync_marker.clone())?,
            duplicate_ids: config.duplicate_ids,
        })
    }
}

/// Result of gating an action through the execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Proceed,
    Skip,
    Decline,
}

/// Sync coordinator for one library and one remote account
pub struct SyncCoordinator {
    config: SyncConfig,

    /// Remote photo service client
    client: Arc<dyn PhotoService>,

    /// Upload content conversion for created photos
    transform: Arc<dyn ContentTransform>,

    /// Persisted remote image records
    cache: ImageCache,

    /// Operator prompt for confirm mode
    confirmation: Option<Arc<dyn Confirmation>>,
}

impl SyncCoordinator {
    /// Create a new sync coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Execution mode, marker and duplicate id policy
    /// * `client` - Remote photo service
    /// * `transform` - Produces upload content for new photos
    /// * `cache` - Image cache store (possibly disabled)
    pub fn new(
        config: SyncConfig,
        client: Arc<dyn PhotoService>,
        transform: Arc<dyn ContentTransform>,
        cache: ImageCache,
    ) -> Self {
        Self {
            config,
            client,
            transform,
            cache,
            confirmation: None,
        }
    }

    /// Sets the prompt used by [`ExecutionMode::Confirm`]
    pub fn with_confirmation(mut self, confirmation: Arc<dyn Confirmation>) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Discovers, then reconciles, against a fresh catalog
    #[instrument(skip(self, source, fs), fields(root = ?root))]
    pub async fn run(
        &self,
        source: &dyn LocalObservationSource,
        fs: &dyn FileSystemAccess,
        root: &Path,
    ) -> Result<SyncReport> {
        let mut catalog = SyncCatalog::new(self.config.duplicate_ids);
        self.discover(&mut catalog, source, fs, root).await?;
        self.reconcile(&mut catalog).await
    }

    /// Populates the catalog from the library, the remote listing and the cache
    ///
    /// # Errors
    ///
    /// Fails when the library root or the remote album list cannot be read,
    /// or when a local observation breaks a catalog invariant.
    #[instrument(skip(self, catalog, source, fs), fields(root = ?root))]
    pub async fn discover(
        &self,
        catalog: &mut SyncCatalog,
        source: &dyn LocalObservationSource,
        fs: &dyn FileSystemAccess,
        root: &Path,
    ) -> Result<DiscoveryStats> {
        let mut stats = DiscoveryStats::default();

        scan_local(catalog, source, fs, root, &mut stats).await?;
        scan_remote(catalog, self.client.as_ref(), &self.config.marker, &mut stats).await?;
        stats.cached_images = catalog.restore_cached(self.cache.load().await);

        info!(
            albums = catalog.albums().len(),
            images = catalog.images().len(),
            cached = stats.cached_images,
            "Found {} albums and {} images",
            catalog.albums().len(),
            catalog.images().len()
        );
        Ok(stats)
    }

    /// Runs the eight reconciliation phases over a populated catalog
    ///
    /// # Errors
    ///
    /// Only misconfiguration is fatal; per-item failures are recorded in the
    /// returned report.
    #[instrument(skip(self, catalog), fields(mode = self.config.mode.as_str()))]
    pub async fn reconcile(&self, catalog: &mut SyncCatalog) -> Result<SyncReport> {
        if self.config.mode == ExecutionMode::Confirm && self.confirmation.is_none() {
            return Err(SyncError::Config(
                "Confirm mode requires a Confirmation implementation".to_string(),
            ));
        }

        let mut report = SyncReport::new(
            SyncRunId::new(),
            catalog.albums().len(),
            catalog.images().len(),
        );
        info!(run_id = %report.run_id, "Starting reconciliation");

        self.apply_albums(catalog, &mut report, &[AlbumAction::LoadPhotos])
            .await;
        self.apply_images(catalog, &mut report, &[ImageAction::LoadPhotos])
            .await;
        self.persist_cache(catalog, &mut report).await;

        self.apply_albums(
            catalog,
            &mut report,
            &[AlbumAction::Create, AlbumAction::Sync],
        )
        .await;
        self.apply_images(
            catalog,
            &mut report,
            &[ImageAction::Create, ImageAction::Sync],
        )
        .await;

        self.apply_albums(catalog, &mut report, &[AlbumAction::Delete])
            .await;
        self.apply_images(catalog, &mut report, &[ImageAction::Delete])
            .await;
        self.persist_cache(catalog, &mut report).await;

        report.finish();
        info!(
            run_id = %report.run_id,
            executed = report.executed(),
            skipped = report.skipped(),
            declined = report.declined(),
            failed = report.failed(),
            "Reconciliation finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Phases
    // ========================================================================

    async fn apply_albums(
        &self,
        catalog: &mut SyncCatalog,
        report: &mut SyncReport,
        actions: &[AlbumAction],
    ) {
        for album_id in catalog.albums().ids() {
            let Some(album) = catalog.album(&album_id) else {
                continue;
            };
            let action = album.action();
            if !actions.contains(&action) {
                continue;
            }

            let message = album.describe(action);
            let status = match self.gate(action.is_mutating(), &message).await {
                Ok(Gate::Proceed) => match self.execute_album(catalog, &album_id, action).await {
                    Ok(()) => OutcomeStatus::Executed,
                    Err(e) => {
                        error!(album_id = %album_id, action = %action, error = %e, "Album action failed");
                        OutcomeStatus::Failed(e.to_string())
                    }
                },
                Ok(Gate::Skip) => OutcomeStatus::Skipped,
                Ok(Gate::Decline) => OutcomeStatus::Declined,
                Err(e) => {
                    error!(album_id = %album_id, error = %e, "Confirmation failed");
                    OutcomeStatus::Failed(e.to_string())
                }
            };

            report.record(ActionOutcome::new(
                EntityKind::Album,
                album_id,
                action.as_str(),
                status,
            ));
        }
    }

    async fn execute_album(
        &self,
        catalog: &mut SyncCatalog,
        album_id: &str,
        action: AlbumAction,
    ) -> Result<()> {
        let client = self.client.as_ref();

        if action == AlbumAction::LoadPhotos {
            catalog.load_album_photos(album_id, client).await?;
            return Ok(());
        }

        let Some(album) = catalog.album_mut(album_id) else {
            return Ok(());
        };

        match action {
            AlbumAction::Create => album.create(client, &self.config.marker).await,
            AlbumAction::Sync => album.sync(client, &self.config.marker).await,
            AlbumAction::Delete => album.delete(client).await,
            AlbumAction::LoadPhotos | AlbumAction::IgnoreDeleted | AlbumAction::IgnoreSynced => {
                Ok(())
            }
        }
    }

    async fn apply_images(
        &self,
        catalog: &mut SyncCatalog,
        report: &mut SyncReport,
        actions: &[ImageAction],
    ) {
        for image_id in catalog.images().ids() {
            let Some(action) = catalog.image_action(&image_id) else {
                continue;
            };
            if !actions.contains(&action) {
                continue;
            }

            let message = match catalog.image(&image_id) {
                Some(image) => image.describe(action, catalog.albums()),
                None => continue,
            };

            let status = match self.gate(action.is_mutating(), &message).await {
                Ok(Gate::Proceed) => match self.execute_image(catalog, &image_id, action).await {
                    Ok(()) => OutcomeStatus::Executed,
                    Err(e) => {
                        error!(image_id = %image_id, action = %action, error = %e, "Image action failed");
                        OutcomeStatus::Failed(e.to_string())
                    }
                },
                Ok(Gate::Skip) => OutcomeStatus::Skipped,
                Ok(Gate::Decline) => OutcomeStatus::Declined,
                Err(e) => {
                    error!(image_id = %image_id, error = %e, "Confirmation failed");
                    OutcomeStatus::Failed(e.to_string())
                }
            };

            report.record(ActionOutcome::new(
                EntityKind::Image,
                image_id,
                action.as_str(),
                status,
            ));
        }
    }

    async fn execute_image(
        &self,
        catalog: &mut SyncCatalog,
        image_id: &str,
        action: ImageAction,
    ) -> Result<()> {
        let client = self.client.as_ref();

        if action == ImageAction::LoadPhotos {
            catalog.load_image_photos(image_id, client).await?;
            return Ok(());
        }

        let Some((image, albums)) = catalog.image_and_albums(image_id) else {
            return Ok(());
        };

        match action {
            ImageAction::Create => image.create(client, self.transform.as_ref(), albums).await,
            ImageAction::Sync => image.sync(client, albums).await,
            ImageAction::Delete => image.delete(client).await,
            ImageAction::LoadPhotos
            | ImageAction::WaitAlbumCreate
            | ImageAction::IgnoreDeleted
            | ImageAction::IgnoreSynced => Ok(()),
        }
    }

    async fn persist_cache(&self, catalog: &mut SyncCatalog, report: &mut SyncReport) {
        if !self.cache.is_enabled() {
            return;
        }

        catalog.normalize_images();
        if let Err(e) = self.cache.save(&catalog.cache_entries()).await {
            error!(error = %e, "Failed to persist image cache");
            report.record(ActionOutcome::new(
                EntityKind::Cache,
                self.cache
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                "persist",
                OutcomeStatus::Failed(e.to_string()),
            ));
        }
    }

    // ========================================================================
    // Execution modes
    // ========================================================================

    /// Read-only actions always proceed; mutating ones follow the mode
    async fn gate(&self, mutating: bool, message: &str) -> Result<Gate> {
        if !mutating {
            debug!("{}", message);
            return Ok(Gate::Proceed);
        }

        match self.config.mode {
            ExecutionMode::Immediate => {
                info!("{}", message);
                Ok(Gate::Proceed)
            }
            ExecutionMode::DryRun => {
                info!("{}", message);
                Ok(Gate::Skip)
            }
            ExecutionMode::Confirm => {
                let Some(confirmation) = self.confirmation.as_ref() else {
                    return Err(SyncError::Config(
                        "Confirm mode requires a Confirmation implementation".to_string(),
                    ));
                };
                if confirmation.confirm(message).await? {
                    Ok(Gate::Proceed)
                } else {
                    info!("Declined: {}", message);
                    Ok(Gate::Decline)
                }
            }
        }
    }
}
