//! # Host Bridge Traits
//!
//! Collaborator contracts that the reconciliation core depends on but never
//! implements itself.
//!
//! ## Overview
//!
//! The core compares a local view of albums and photos against a remote view.
//! Everything that touches the outside world is reached through one of the
//! traits below, so hosts (and tests) can substitute their own implementation.
//!
//! ## Traits
//!
//! ### Remote service
//! - [`PhotoService`](photos::PhotoService) - Album/photo listing and mutation
//! - [`ContentTransform`](photos::ContentTransform) - Turns a local file into upload content
//!
//! ### Local host
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O and extended attributes
//! - [`Confirmation`](prompt::Confirmation) - Interactive operator confirmation
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should map transport failures onto the typed remote
//! variants (`Unauthorized`, `RateLimited`, `NotFound`, `Rejected`) so the core
//! can report them precisely.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so handles can be shared via
//! `Arc` across async tasks.

pub mod error;
pub mod logging;
pub mod photos;
pub mod prompt;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use photos::{
    AlbumAccess, AlbumFields, ContentTransform, MediaContent, PhotoFields, PhotoService,
    RemoteAlbum, RemotePhoto,
};
pub use prompt::{Confirmation, FixedConfirmation};
pub use storage::{FileMetadata, FileSystemAccess};
