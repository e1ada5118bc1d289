//! Integration tests for the reconciliation workflow
//!
//! These tests drive complete runs against a temporary library directory and
//! an in-memory photo service:
//! - First run creates albums and photos
//! - Repeated runs converge without further mutations
//! - Photo lists are only fetched when counts disagree
//! - Local deletions, moves and edits propagate
//! - Dry-run and confirm modes gate mutations

use bridge_desktop::TokioFileSystem;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    AlbumFields, ContentTransform, FixedConfirmation, MediaContent, PhotoFields, PhotoService,
    RemoteAlbum, RemotePhoto,
};
use core_runtime::config::{DuplicateIdPolicy, ExecutionMode};
use core_sync::{
    AlbumAction, AlbumRecord, EntityKind, ImageAction, ImageCache, ImageRecord, Keywords,
    LocalObservationSource, OutcomeStatus, SyncCatalog, SyncConfig, SyncCoordinator, SyncError,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex as AsyncMutex;

// ============================================================================
// Fake Implementations
// ============================================================================

#[derive(Default)]
struct FakeState {
    next_id: u32,
    albums: BTreeMap<String, RemoteAlbum>,
    photos: BTreeMap<String, RemotePhoto>,
    calls: Vec<String>,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn photo_count(&self, album_id: &str) -> u32 {
        self.photos
            .values()
            .filter(|p| p.album_id == album_id)
            .count() as u32
    }
}

/// In-memory photo service with a call log
#[derive(Default)]
struct FakePhotoService {
    state: AsyncMutex<FakeState>,
}

impl FakePhotoService {
    async fn seed_album(&self, title: &str, summary: &str) -> String {
        let mut state = self.state.lock().await;
        let id = state.next_id("album");
        state.albums.insert(
            id.clone(),
            RemoteAlbum {
                id: id.clone(),
                title: title.to_string(),
                summary: summary.to_string(),
                timestamp: 0,
                num_photos: 0,
            },
        );
        id
    }

    /// Removes a photo behind the engine's back (e.g. via the web UI)
    async fn remove_photo_by_title(&self, title: &str) {
        let mut state = self.state.lock().await;
        state.photos.retain(|_, p| p.title != title);
    }

    async fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().await.calls)
    }

    async fn album_by_title(&self, title: &str) -> Option<RemoteAlbum> {
        let state = self.state.lock().await;
        state.albums.values().find(|a| a.title == title).cloned()
    }

    async fn photo_by_title(&self, title: &str) -> Option<RemotePhoto> {
        let state = self.state.lock().await;
        state.photos.values().find(|p| p.title == title).cloned()
    }
}

#[async_trait::async_trait]
impl PhotoService for FakePhotoService {
    async fn list_albums(&self) -> BridgeResult<Vec<RemoteAlbum>> {
        let mut state = self.state.lock().await;
        state.calls.push("list_albums".to_string());
        let albums = state
            .albums
            .values()
            .map(|a| RemoteAlbum {
                num_photos: state.photo_count(&a.id),
                ..a.clone()
            })
            .collect();
        Ok(albums)
    }

    async fn show_album(&self, album_id: &str) -> BridgeResult<Vec<RemotePhoto>> {
        let mut state = self.state.lock().await;
        let title = state
            .albums
            .get(album_id)
            .map(|a| a.title.clone())
            .ok_or_else(|| BridgeError::NotFound(album_id.to_string()))?;
        state.calls.push(format!("show_album:{}", title));
        Ok(state
            .photos
            .values()
            .filter(|p| p.album_id == album_id)
            .cloned()
            .collect())
    }

    async fn create_album(&self, fields: &AlbumFields) -> BridgeResult<RemoteAlbum> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("create_album:{}", fields.title));
        let id = state.next_id("album");
        let album = RemoteAlbum {
            id: id.clone(),
            title: fields.title.clone(),
            summary: fields.summary.clone(),
            timestamp: fields.timestamp,
            num_photos: 0,
        };
        state.albums.insert(id, album.clone());
        Ok(album)
    }

    async fn update_album(&self, album_id: &str, fields: &AlbumFields) -> BridgeResult<RemoteAlbum> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("update_album:{}", fields.title));
        let count = state.photo_count(album_id);
        let album = state
            .albums
            .get_mut(album_id)
            .ok_or_else(|| BridgeError::NotFound(album_id.to_string()))?;
        album.title = fields.title.clone();
        album.summary = fields.summary.clone();
        album.timestamp = fields.timestamp;
        album.num_photos = count;
        Ok(album.clone())
    }

    async fn delete_album(&self, album_id: &str) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        let album = state
            .albums
            .remove(album_id)
            .ok_or_else(|| BridgeError::NotFound(album_id.to_string()))?;
        state.calls.push(format!("delete_album:{}", album.title));
        state.photos.retain(|_, p| p.album_id != album_id);
        Ok(())
    }

    async fn create_photo(
        &self,
        album_id: &str,
        fields: &PhotoFields,
        _content: MediaContent,
    ) -> BridgeResult<RemotePhoto> {
        let mut state = self.state.lock().await;
        if !state.albums.contains_key(album_id) {
            return Err(BridgeError::NotFound(album_id.to_string()));
        }
        state.calls.push(format!("create_photo:{}", fields.title));
        let id = state.next_id("photo");
        let photo = RemotePhoto {
            id: id.clone(),
            album_id: album_id.to_string(),
            title: fields.title.clone(),
            summary: fields.summary.clone(),
            timestamp: fields.timestamp,
            keywords: Some(fields.keywords.clone()),
        };
        state.photos.insert(id, photo.clone());
        Ok(photo)
    }

    async fn update_photo(
        &self,
        _album_id: &str,
        photo_id: &str,
        fields: &PhotoFields,
        target_album_id: &str,
    ) -> BridgeResult<RemotePhoto> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("update_photo:{}", fields.title));
        let photo = state
            .photos
            .get_mut(photo_id)
            .ok_or_else(|| BridgeError::NotFound(photo_id.to_string()))?;
        photo.album_id = target_album_id.to_string();
        photo.summary = fields.summary.clone();
        photo.timestamp = fields.timestamp;
        photo.keywords = Some(fields.keywords.clone());
        Ok(photo.clone())
    }

    async fn delete_photo(&self, _album_id: &str, photo_id: &str) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        let photo = state
            .photos
            .remove(photo_id)
            .ok_or_else(|| BridgeError::NotFound(photo_id.to_string()))?;
        state.calls.push(format!("delete_photo:{}", photo.title));
        Ok(())
    }
}

struct FileTransform;

#[async_trait::async_trait]
impl ContentTransform for FileTransform {
    async fn transform(&self, path: &Path) -> BridgeResult<MediaContent> {
        Ok(MediaContent::File {
            path: path.to_path_buf(),
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

/// Album id = lowercased directory name; image id = file stem; caption =
/// file contents. Timestamps are fixed so records only change when a test
/// changes them.
struct TestSource;

#[async_trait::async_trait]
impl LocalObservationSource for TestSource {
    async fn observe_directory(
        &self,
        directory: &Path,
    ) -> core_sync::Result<Option<(String, AlbumRecord)>> {
        let title = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Some((title.to_lowercase(), AlbumRecord::new(title, 100, ""))))
    }

    async fn observe_file(
        &self,
        album_id: &str,
        file: &Path,
    ) -> core_sync::Result<Option<(String, ImageRecord)>> {
        let id = file
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let caption = std::fs::read_to_string(file).map_err(|e| SyncError::Observation {
            path: file.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some((
            id,
            ImageRecord::new(album_id, 200, caption.trim(), Keywords::parse("holiday")),
        )))
    }
}

struct Harness {
    library: TempDir,
    state_dir: TempDir,
    service: Arc<FakePhotoService>,
}

impl Harness {
    fn new() -> Self {
        Self {
            library: tempfile::tempdir().unwrap(),
            state_dir: tempfile::tempdir().unwrap(),
            service: Arc::new(FakePhotoService::default()),
        }
    }

    fn root(&self) -> &Path {
        self.library.path()
    }

    fn write(&self, relative: &str, caption: &str) {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, caption).unwrap();
    }

    fn remove(&self, relative: &str) {
        let path = self.root().join(relative);
        if path.is_dir() {
            std::fs::remove_dir_all(path).unwrap();
        } else {
            std::fs::remove_file(path).unwrap();
        }
    }

    fn cache_path(&self) -> PathBuf {
        self.state_dir.path().join("images.json")
    }

    fn coordinator(&self, mode: ExecutionMode, cached: bool) -> SyncCoordinator {
        let config = SyncConfig {
            mode,
            ..SyncConfig::default()
        };
        let cache = ImageCache::new(
            Arc::new(TokioFileSystem::new()),
            cached.then(|| self.cache_path()),
        );
        SyncCoordinator::new(config, self.service.clone(), Arc::new(FileTransform), cache)
    }

    async fn run(&self, mode: ExecutionMode) -> core_sync::SyncReport {
        self.coordinator(mode, true)
            .run(&TestSource, &TokioFileSystem::new(), self.root())
            .await
            .unwrap()
    }

    fn mutations(calls: &[String]) -> Vec<String> {
        calls
            .iter()
            .filter(|c| !c.starts_with("list_albums") && !c.starts_with("show_album"))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_first_run_creates_album_then_photo() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "Sunset");

    let report = harness.run(ExecutionMode::Immediate).await;

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "create_album:Trip", "create_photo:IMG1"]
    );
    assert_eq!(report.executed(), 2);
    assert!(!report.has_failures());

    let album = harness.service.album_by_title("Trip").await.unwrap();
    assert_eq!(album.summary, "(pws:trip)");

    let photo = harness.service.photo_by_title("IMG1").await.unwrap();
    assert_eq!(photo.album_id, album.id);
    assert_eq!(photo.summary, "Sunset");
    assert_eq!(photo.keywords.as_deref(), Some("holiday"));
}

#[tokio::test]
async fn test_catalog_state_after_each_phase_group() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");

    let coordinator = harness.coordinator(ExecutionMode::Immediate, false);
    let fs = TokioFileSystem::new();
    let mut catalog = SyncCatalog::new(DuplicateIdPolicy::Overwrite);
    coordinator
        .discover(&mut catalog, &TestSource, &fs, harness.root())
        .await
        .unwrap();

    assert_eq!(catalog.album_action("trip"), Some(AlbumAction::Create));
    assert_eq!(catalog.image_action("IMG1"), Some(ImageAction::WaitAlbumCreate));

    coordinator.reconcile(&mut catalog).await.unwrap();

    let album = catalog.album("trip").unwrap();
    assert_eq!(album.remote(), album.local());
    assert!(album.photo_list_loaded());
    let image = catalog.image("IMG1").unwrap();
    assert_eq!(image.remote(), image.local());
    assert_eq!(catalog.image_action("IMG1"), Some(ImageAction::IgnoreSynced));
}

#[tokio::test]
async fn test_second_run_with_cache_makes_no_remote_reads() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "Sunset");
    harness.write("Trip/IMG2.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    let report = harness.run(ExecutionMode::Immediate).await;

    assert_eq!(harness.service.take_calls().await, vec!["list_albums"]);
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn test_second_run_without_cache_loads_once() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "Sunset");
    harness.write("Trip/IMG2.jpg", "");

    let coordinator = harness.coordinator(ExecutionMode::Immediate, false);
    let fs = TokioFileSystem::new();
    coordinator.run(&TestSource, &fs, harness.root()).await.unwrap();
    harness.service.take_calls().await;

    coordinator.run(&TestSource, &fs, harness.root()).await.unwrap();

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "show_album:Trip"]
    );
}

#[tokio::test]
async fn test_count_mismatch_loads_photos_and_uploads_new_file() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    harness.write("Trip/IMG2.jpg", "");
    let report = harness.run(ExecutionMode::Immediate).await;

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "show_album:Trip", "create_photo:IMG2"]
    );
    assert_eq!(
        report
            .outcomes_for(EntityKind::Album, "load_photos")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_removed_file_is_deleted_remotely() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");
    harness.write("Trip/IMG2.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    harness.remove("Trip/IMG2.jpg");
    harness.run(ExecutionMode::Immediate).await;

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "show_album:Trip", "delete_photo:IMG2"]
    );

    let cache = ImageCache::new(Arc::new(TokioFileSystem::new()), Some(harness.cache_path()));
    let entries = cache.load().await;
    assert!(entries.contains_key("IMG1"));
    assert!(!entries.contains_key("IMG2"));
}

#[tokio::test]
async fn test_stale_cache_entry_is_dropped_without_delete() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    // Gone on both sides; only the cache still remembers it
    harness.remove("Trip/IMG1.jpg");
    harness.service.remove_photo_by_title("IMG1").await;

    let coordinator = harness.coordinator(ExecutionMode::Immediate, true);
    let fs = TokioFileSystem::new();
    let mut catalog = SyncCatalog::new(DuplicateIdPolicy::Overwrite);
    coordinator
        .discover(&mut catalog, &TestSource, &fs, harness.root())
        .await
        .unwrap();
    assert!(catalog.image("IMG1").unwrap().is_cached());

    coordinator.reconcile(&mut catalog).await.unwrap();

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "show_album:Trip"]
    );
    assert!(catalog.image("IMG1").unwrap().remote().is_none());
    assert_eq!(catalog.image_action("IMG1"), Some(ImageAction::IgnoreDeleted));

    let cache = ImageCache::new(Arc::new(TokioFileSystem::new()), Some(harness.cache_path()));
    assert!(cache.load().await.is_empty());
}

#[tokio::test]
async fn test_removed_directory_deletes_album_only() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");
    harness.write("Home/IMG2.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    harness.remove("Trip");
    let report = harness.run(ExecutionMode::Immediate).await;

    let mutations = Harness::mutations(&harness.service.take_calls().await);
    assert_eq!(mutations, vec!["delete_album:Trip"]);
    assert!(harness.service.album_by_title("Trip").await.is_none());
    assert!(harness.service.photo_by_title("IMG2").await.is_some());
    assert_eq!(report.outcomes_for(EntityKind::Image, "delete").count(), 0);
}

#[tokio::test]
async fn test_unmanaged_albums_are_left_alone() {
    let harness = Harness::new();
    harness.service.seed_album("Family", "Shared with grandma").await;
    harness.service.seed_album("Other tool", "(rps:other)").await;
    harness.write("Trip/IMG1.jpg", "");

    harness.run(ExecutionMode::Immediate).await;

    let mutations = Harness::mutations(&harness.service.take_calls().await);
    assert_eq!(mutations, vec!["create_album:Trip", "create_photo:IMG1"]);
    assert!(harness.service.album_by_title("Family").await.is_some());
    assert!(harness.service.album_by_title("Other tool").await.is_some());
}

#[tokio::test]
async fn test_moved_file_is_moved_remotely() {
    let harness = Harness::new();
    harness.write("Inbox/IMG1.jpg", "");
    harness.write("Trip/IMG2.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    harness.remove("Inbox/IMG1.jpg");
    harness.write("Trip/IMG1.jpg", "");
    harness.run(ExecutionMode::Immediate).await;

    let mutations = Harness::mutations(&harness.service.take_calls().await);
    assert_eq!(mutations, vec!["update_photo:IMG1"]);

    let trip = harness.service.album_by_title("Trip").await.unwrap();
    let photo = harness.service.photo_by_title("IMG1").await.unwrap();
    assert_eq!(photo.album_id, trip.id);
}

#[tokio::test]
async fn test_caption_edit_is_synced() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "Sunset");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    harness.write("Trip/IMG1.jpg", "Sunset over the bay");
    harness.run(ExecutionMode::Immediate).await;

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "show_album:Trip", "update_photo:IMG1"]
    );
    let photo = harness.service.photo_by_title("IMG1").await.unwrap();
    assert_eq!(photo.summary, "Sunset over the bay");
}

#[tokio::test]
async fn test_dry_run_reports_without_mutating() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");

    let report = harness.run(ExecutionMode::DryRun).await;

    assert_eq!(harness.service.take_calls().await, vec!["list_albums"]);
    assert_eq!(report.skipped(), 1);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == OutcomeStatus::Skipped));
}

#[tokio::test]
async fn test_dry_run_still_loads_photos() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");
    harness.run(ExecutionMode::Immediate).await;
    harness.service.take_calls().await;

    harness.write("Trip/IMG2.jpg", "");
    let report = harness.run(ExecutionMode::DryRun).await;

    assert_eq!(
        harness.service.take_calls().await,
        vec!["list_albums", "show_album:Trip"]
    );
    assert_eq!(report.executed(), 1);
    assert_eq!(report.skipped(), 1);
}

#[tokio::test]
async fn test_confirm_mode_executes_accepted_actions() {
    let harness = Harness::new();
    harness.write("Trip/IMG1.jpg", "");

    let coordinator = harness
        .coordinator(ExecutionMode::Confirm, true)
        .with_confirmation(Arc::new(FixedConfirmation(true)));
    let report = coordinator
        .run(&TestSource, &TokioFileSystem::new(), harness.root())
        .await
        .unwrap();

    assert_eq!(report.executed(), 2);
    assert!(harness.service.photo_by_title("IMG1").await.is_some());
}

#[tokio::test]
async fn test_duplicate_ids_rejected_when_configured() {
    let harness = Harness::new();
    harness.write("A/IMG1.jpg", "");
    harness.write("B/IMG1.jpg", "");

    let config = SyncConfig {
        duplicate_ids: DuplicateIdPolicy::Reject,
        ..SyncConfig::default()
    };
    let cache = ImageCache::new(Arc::new(TokioFileSystem::new()), None);
    let coordinator =
        SyncCoordinator::new(config, harness.service.clone(), Arc::new(FileTransform), cache);

    let result = coordinator
        .run(&TestSource, &TokioFileSystem::new(), harness.root())
        .await;

    assert!(matches!(result, Err(SyncError::DuplicateImageId { .. })));
    assert!(Harness::mutations(&harness.service.take_calls().await).is_empty());
}

#[tokio::test]
async fn test_hidden_entries_are_ignored() {
    let harness = Harness::new();
    harness.write(".thumbnails/IMG9.jpg", "");
    harness.write("Trip/.picasa.ini", "");
    harness.write("Trip/IMG1.jpg", "");

    harness.run(ExecutionMode::Immediate).await;

    let mutations = Harness::mutations(&harness.service.take_calls().await);
    assert_eq!(mutations, vec!["create_album:Trip", "create_photo:IMG1"]);
}
