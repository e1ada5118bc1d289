//! # Core Configuration Module
//!
//! Provides configuration management for the album sync core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all dependencies and settings needed to reconcile a
//! local photo library against a remote photo-hosting service. It enforces
//! fail-fast validation so a run never starts half-configured.
//!
//! ## Required Dependencies
//!
//! - `library_root` - Directory whose sub-directories are albums
//! - `PhotoService` - Remote photo-hosting client
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `FileSystemAccess` - File I/O (desktop default: tokio fs + xattr)
//! - `Confirmation` - Operator prompt, needed by [`ExecutionMode::Confirm`]
//!   (desktop default: terminal prompt)
//! - `ContentTransform` - Upload content conversion (default: upload as-is)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ExecutionMode};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .library_root("/home/jo/Pictures")
//!     .cache_path("/home/jo/.cache/album-sync/images.json")
//!     .execution_mode(ExecutionMode::Confirm)
//!     .photo_service(Arc::new(MyPhotoService::connect()?))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Missing bridges surface as [`Error::CapabilityMissing`] with a message that
//! explains how to provide them; invalid values surface as [`Error::Config`].

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{Confirmation, ContentTransform, FileSystemAccess, PhotoService};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Token embedded in remote album summaries when none is configured
pub const DEFAULT_SYNC_MARKER: &str = "pws";

/// How mutating actions are carried out during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Execute every action without asking
    #[default]
    Immediate,
    /// Describe each mutating action and ask the operator first
    Confirm,
    /// Describe mutating actions without executing them
    DryRun,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Immediate => "immediate",
            ExecutionMode::Confirm => "confirm",
            ExecutionMode::DryRun => "dry-run",
        }
    }
}

/// What to do when two local files claim the same image id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateIdPolicy {
    /// The later observation replaces the earlier one
    #[default]
    Overwrite,
    /// Refuse the later observation with an error
    Reject,
}

/// Core configuration for the album sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory whose immediate sub-directories are local albums
    pub library_root: PathBuf,

    /// Image cache location; `None` disables the cache
    pub cache_path: Option<PathBuf>,

    /// Token used in the `(<token>:<id>)` album marker
    pub sync_marker: String,

    pub execution_mode: ExecutionMode,

    pub duplicate_ids: DuplicateIdPolicy,

    /// Remote photo-hosting client (required)
    pub photo_service: Arc<dyn PhotoService>,

    /// File system access abstraction
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Upload content conversion (optional; callers fall back to the original file)
    pub content_transform: Option<Arc<dyn ContentTransform>>,

    /// Operator prompt, always present in confirm mode
    pub confirmation: Option<Arc<dyn Confirmation>>,

    pub logging: LoggingConfig,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("library_root", &self.library_root)
            .field("cache_path", &self.cache_path)
            .field("sync_marker", &self.sync_marker)
            .field("execution_mode", &self.execution_mode)
            .field("duplicate_ids", &self.duplicate_ids)
            .field("photo_service", &"PhotoService { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field(
                "content_transform",
                &self
                    .content_transform
                    .as_ref()
                    .map(|_| "ContentTransform { ... }"),
            )
            .field(
                "confirmation",
                &self.confirmation.as_ref().map(|_| "Confirmation { ... }"),
            )
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Library root is not empty
    /// - Cache path, when set, is not empty
    /// - Sync marker is a usable token
    /// - Confirm mode has a confirmation bridge
    pub fn validate(&self) -> Result<()> {
        if self.library_root.as_os_str().is_empty() {
            return Err(Error::Config("Library root cannot be empty".to_string()));
        }

        if let Some(path) = &self.cache_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config(
                    "Cache path cannot be empty. Omit it to disable the image cache.".to_string(),
                ));
            }
        }

        validate_sync_marker(&self.sync_marker)?;

        if self.execution_mode == ExecutionMode::Confirm && self.confirmation.is_none() {
            return Err(confirmation_missing_error());
        }

        Ok(())
    }
}

/// Checks that a marker token can round-trip through an album summary.
pub fn validate_sync_marker(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::Config("Sync marker cannot be empty".to_string()));
    }

    if let Some(bad) = token.chars().find(|c| matches!(c, '(' | ')' | ':')) {
        return Err(Error::Config(format!(
            "Sync marker '{}' cannot contain '{}'",
            token, bad
        )));
    }

    if token.chars().any(char::is_whitespace) {
        return Err(Error::Config(format!(
            "Sync marker '{}' cannot contain whitespace",
            token
        )));
    }

    Ok(())
}

fn photo_service_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PhotoService".to_string(),
        message: "PhotoService implementation is required to reach the photo-hosting service. \
                 Inject an authenticated client with .photo_service()."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to scan the library and persist the cache. \
                 Desktop: enable the 'desktop-shims' feature to use the default TokioFileSystem. \
                 Otherwise inject one with .file_system()."
            .to_string(),
    }
}

fn confirmation_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "Confirmation".to_string(),
        message: "Confirm mode asks the operator before every mutating action. \
                 Desktop: enable the 'desktop-shims' feature to use the default TerminalConfirmation. \
                 Otherwise inject one with .confirmation() or pick another execution mode."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_confirmation() -> Option<Arc<dyn Confirmation>> {
    use bridge_desktop::TerminalConfirmation;

    let prompt: Arc<dyn Confirmation> = Arc::new(TerminalConfirmation::new());
    Some(prompt)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_confirmation() -> Option<Arc<dyn Confirmation>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    library_root: Option<PathBuf>,
    cache_path: Option<PathBuf>,
    sync_marker: Option<String>,
    execution_mode: ExecutionMode,
    duplicate_ids: DuplicateIdPolicy,
    photo_service: Option<Arc<dyn PhotoService>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    content_transform: Option<Arc<dyn ContentTransform>>,
    confirmation: Option<Arc<dyn Confirmation>>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the library root (required).
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .library_root("/home/jo/Pictures");
    /// ```
    pub fn library_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_root = Some(path.into());
        self
    }

    /// Sets the image cache file. Without it, every run starts cold.
    pub fn cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Sets the album marker token.
    ///
    /// Default: `"pws"`
    pub fn sync_marker(mut self, token: impl Into<String>) -> Self {
        self.sync_marker = Some(token.into());
        self
    }

    /// Default: [`ExecutionMode::Immediate`]
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    /// Default: [`DuplicateIdPolicy::Overwrite`]
    pub fn duplicate_ids(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }

    /// Sets the remote photo service client (required).
    pub fn photo_service(mut self, service: Arc<dyn PhotoService>) -> Self {
        self.photo_service = Some(service);
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn content_transform(mut self, transform: Arc<dyn ContentTransform>) -> Self {
        self.content_transform = Some(transform);
        self
    }

    /// Sets the operator prompt used in confirm mode.
    ///
    /// If not provided, the terminal prompt is used when the `desktop-shims`
    /// feature is enabled.
    pub fn confirmation(mut self, confirmation: Arc<dyn Confirmation>) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The library root or photo service is missing
    /// - No file system is available
    /// - Confirm mode is selected without a confirmation bridge
    /// - The sync marker is unusable
    pub fn build(self) -> Result<CoreConfig> {
        let library_root = self.library_root.ok_or_else(|| {
            Error::Config("Library root is required. Use .library_root() to set it.".to_string())
        })?;

        let photo_service = self.photo_service.ok_or_else(photo_service_missing_error)?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let confirmation = match self.confirmation {
            Some(prompt) => Some(prompt),
            None if self.execution_mode == ExecutionMode::Confirm => {
                provide_default_confirmation()
            }
            None => None,
        };

        let config = CoreConfig {
            library_root,
            cache_path: self.cache_path,
            sync_marker: self
                .sync_marker
                .unwrap_or_else(|| DEFAULT_SYNC_MARKER.to_string()),
            execution_mode: self.execution_mode,
            duplicate_ids: self.duplicate_ids,
            photo_service,
            file_system,
            content_transform: self.content_transform,
            confirmation,
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
