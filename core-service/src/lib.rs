//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] and a local observation
//! [`RuleSet`] into a ready-to-run [`AlbumSyncService`]. Desktop hosts enable
//! the `desktop-shims` feature so the file system and terminal prompt fall back
//! to the implementations in `bridge-desktop`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ExecutionMode};
//! use core_metadata::RuleSet;
//! use core_service::bootstrap;
//!
//! let config = CoreConfig::builder()
//!     .library_root("/home/me/Pictures")
//!     .cache_path("/home/me/.cache/album-sync/images.json")
//!     .execution_mode(ExecutionMode::Confirm)
//!     .photo_service(client)
//!     .build()?;
//!
//! let service = bootstrap(config, RuleSet::exif())?;
//! let report = service.sync().await?;
//! for failure in report.failures() {
//!     eprintln!("{}", failure);
//! }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::path::Path;
use std::sync::Arc;

use bridge_traits::{ContentTransform, FileSystemAccess};
use core_metadata::{PassthroughTransform, RuleBasedSource, RuleSet};
use core_runtime::config::CoreConfig;
use core_runtime::logging::init_logging;
use core_sync::{ImageCache, SyncConfig, SyncCoordinator, SyncReport};
use tracing::info;

/// Primary façade exposed to host applications.
pub struct AlbumSyncService {
    library_root: Arc<Path>,
    file_system: Arc<dyn FileSystemAccess>,
    source: RuleBasedSource,
    coordinator: SyncCoordinator,
}

impl AlbumSyncService {
    /// Create a service observing the library with the standard rules.
    pub fn new(config: CoreConfig) -> Result<Self> {
        Self::with_rules(config, RuleSet::default())
    }

    /// Create a service observing the library with `rules`.
    ///
    /// The upload transform defaults to [`PassthroughTransform`].
    pub fn with_rules(config: CoreConfig, rules: RuleSet) -> Result<Self> {
        config.validate()?;

        let sync_config = SyncConfig::from_core(&config)?;
        let transform: Arc<dyn ContentTransform> = config
            .content_transform
            .clone()
            .unwrap_or_else(|| Arc::new(PassthroughTransform));
        let cache = ImageCache::new(config.file_system.clone(), config.cache_path.clone());

        let mut coordinator = SyncCoordinator::new(
            sync_config,
            config.photo_service.clone(),
            transform,
            cache,
        );
        if let Some(confirmation) = config.confirmation.clone() {
            coordinator = coordinator.with_confirmation(confirmation);
        }

        Ok(Self {
            library_root: Arc::from(config.library_root.as_path()),
            source: RuleBasedSource::new(rules, config.file_system.clone()),
            file_system: config.file_system,
            coordinator,
        })
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Run one full reconciliation of the library against the remote service.
    pub async fn sync(&self) -> Result<SyncReport> {
        info!(
            root = %self.library_root.display(),
            mode = self.coordinator.config().mode.as_str(),
            "Synchronising library"
        );
        let report = self
            .coordinator
            .run(&self.source, self.file_system.as_ref(), &self.library_root)
            .await?;
        Ok(report)
    }
}

/// Initialise logging from the configuration, then build the service.
///
/// Call once per process; a second call fails because the global subscriber
/// is already installed.
pub fn bootstrap(config: CoreConfig, rules: RuleSet) -> Result<AlbumSyncService> {
    init_logging(config.logging.clone())
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    AlbumSyncService::with_rules(config, rules)
}
