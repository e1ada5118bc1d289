//! # Album Sync Engine
//!
//! Reconciles a tree of local album directories against the albums and photos
//! of a remote photo-hosting service.
//!
//! ## Overview
//!
//! Every album and image is held as up to three views: what the library
//! holds locally, what the remote service listed this run, and what the cache
//! remembers from the previous run. A pure decision function maps those views
//! to a single next action, and the coordinator applies actions in dependency
//! order while tolerating per-item failures.
//!
//! ## Components
//!
//! - **Records** (`records`): `AlbumRecord`, `ImageRecord` and `Keywords` value types
//! - **Sync Marker** (`marker`): Embeds and parses the album id in remote summaries
//! - **Albums** (`album`): Album entity, decision rules and registry
//! - **Images** (`image`): Image entity, normalisation, decision rules and registry
//! - **Catalog** (`catalog`): Owns both registries and routes observations
//! - **Cache** (`cache`): Persisted remote image records
//! - **Discovery** (`discovery`): Local scan and remote album listing
//! - **Sync Coordinator** (`coordinator`): Phase-ordered reconciliation
//! - **Reports** (`report`): Per-action outcomes of a run

pub mod album;
pub mod cache;
pub mod catalog;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod image;
pub mod marker;
pub mod records;
pub mod report;

pub use album::{Album, AlbumAction, AlbumRegistry};
pub use cache::{CacheEntries, ImageCache};
pub use catalog::SyncCatalog;
pub use coordinator::{SyncConfig, SyncCoordinator};
pub use discovery::{scan_local, scan_remote, DiscoveryStats, LocalObservationSource};
pub use error::{Result, SyncError};
pub use image::{Image, ImageAction, ImageRegistry};
pub use marker::SyncMarker;
pub use records::{AlbumRecord, ImageRecord, Keywords};
pub use report::{ActionOutcome, EntityKind, OutcomeStatus, SyncReport, SyncRunId};
