//! Integration tests for the observation rule presets
//!
//! Extended attributes come from an in-memory file system so the tests do not
//! depend on the host file system supporting `user.*` attributes. EXIF tests
//! read a real JPEG from a temporary directory.

use bridge_desktop::TokioFileSystem;
use bridge_traits::{error::Result as BridgeResult, BridgeError, FileMetadata, FileSystemAccess};
use bytes::Bytes;
use core_metadata::{
    ContentTypeMatcher, MetadataContext, RuleBasedSource, RuleSet, XattrFile,
};
use core_sync::{AlbumRecord, Keywords, LocalObservationSource, SyncError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

// ============================================================================
// Fake Implementations
// ============================================================================

#[derive(Default)]
struct FakeFileSystem {
    entries: HashMap<PathBuf, FileMetadata>,
    xattrs: HashMap<(PathBuf, String), String>,
    xattr_reads: AsyncMutex<usize>,
}

impl FakeFileSystem {
    fn with_dir(mut self, path: &str, mtime: i64) -> Self {
        self.entries.insert(
            PathBuf::from(path),
            FileMetadata {
                size: 0,
                created_at: None,
                modified_at: Some(mtime),
                is_directory: true,
            },
        );
        self
    }

    fn with_file(mut self, path: &str, size: u64, mtime: i64) -> Self {
        self.entries.insert(
            PathBuf::from(path),
            FileMetadata {
                size,
                created_at: None,
                modified_at: Some(mtime),
                is_directory: false,
            },
        );
        self
    }

    fn with_xattr(mut self, path: &str, name: &str, value: &str) -> Self {
        self.xattrs
            .insert((PathBuf::from(path), name.to_string()), value.to_string());
        self
    }

    async fn xattr_reads(&self) -> usize {
        *self.xattr_reads.lock().await
    }
}

#[async_trait::async_trait]
impl FileSystemAccess for FakeFileSystem {
    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        Ok(self.entries.contains_key(path))
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
    }

    async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
        Err(BridgeError::NotAvailable("read-only".to_string()))
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        Err(BridgeError::NotFound(path.display().to_string()))
    }

    async fn write_file(&self, _path: &Path, _data: Bytes) -> BridgeResult<()> {
        Err(BridgeError::NotAvailable("read-only".to_string()))
    }

    async fn list_directory(&self, _path: &Path) -> BridgeResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    async fn read_xattr(&self, path: &Path, name: &str) -> BridgeResult<Option<String>> {
        *self.xattr_reads.lock().await += 1;
        Ok(self
            .xattrs
            .get(&(path.to_path_buf(), name.to_string()))
            .cloned())
    }
}

fn context(fs: &Arc<FakeFileSystem>, path: &str) -> MetadataContext {
    MetadataContext::new(fs.clone(), path)
}

/// Minimal JPEG whose EXIF block holds the given ASCII tags, in ascending order
///
/// Every value must be longer than three bytes so it lives outside the entry.
fn jpeg_with_ascii_tags(tags: &[(u16, &str)]) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&(tags.len() as u16).to_le_bytes());

    let mut offset = (8 + 2 + 12 * tags.len() + 4) as u32;
    let mut data = Vec::new();
    for (tag, text) in tags {
        let mut value = text.as_bytes().to_vec();
        value.push(0);
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
        tiff.extend_from_slice(&offset.to_le_bytes());
        offset += value.len() as u32;
        data.extend_from_slice(&value);
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&data);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn jpeg_with_description(description: &str) -> Vec<u8> {
    jpeg_with_ascii_tags(&[(0x010E, description)])
}

// ============================================================================
// Default preset
// ============================================================================

#[tokio::test]
async fn test_default_album_uses_directory_name() {
    let fs = Arc::new(FakeFileSystem::default().with_dir("/photos/Trip", 1_000));

    let observed = RuleSet::default()
        .observe_directory(&context(&fs, "/photos/Trip"))
        .await
        .unwrap();

    assert_eq!(
        observed,
        Some(("Trip".to_string(), AlbumRecord::new("Trip", 1_000, "")))
    );
}

#[tokio::test]
async fn test_default_image_uses_stem_and_mtime() {
    let fs = Arc::new(FakeFileSystem::default().with_file("/photos/Trip/IMG1.jpg", 10, 2_000));

    let (id, record) = RuleSet::default()
        .observe_file("Trip", &context(&fs, "/photos/Trip/IMG1.jpg"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(id, "IMG1");
    assert_eq!(record.album_id, "Trip");
    assert_eq!(record.timestamp, 2_000);
    assert_eq!(record.caption, "");
    assert!(record.keywords.is_empty());
}

#[tokio::test]
async fn test_unmatched_content_type_is_not_managed() {
    let fs = Arc::new(FakeFileSystem::default().with_file("/photos/Trip/notes.txt", 10, 2_000));

    let observed = RuleSet::default()
        .observe_file("Trip", &context(&fs, "/photos/Trip/notes.txt"))
        .await
        .unwrap();

    assert!(observed.is_none());
}

#[tokio::test]
async fn test_large_videos_are_skipped() {
    let fs = Arc::new(
        FakeFileSystem::default()
            .with_file("/photos/Trip/small.mp4", 1024, 1)
            .with_file("/photos/Trip/big.mp4", 104_857_600, 1),
    );
    let rules = RuleSet::default();

    let small = rules
        .observe_file("Trip", &context(&fs, "/photos/Trip/small.mp4"))
        .await
        .unwrap();
    let big = rules
        .observe_file("Trip", &context(&fs, "/photos/Trip/big.mp4"))
        .await
        .unwrap();

    assert_eq!(small.map(|(id, _)| id).as_deref(), Some("small"));
    assert!(big.is_none());
}

// ============================================================================
// Attribute presets
// ============================================================================

#[tokio::test]
async fn test_xattr_tagged_overrides_album_id_and_comment() {
    let fs = Arc::new(
        FakeFileSystem::default()
            .with_dir("/photos/Trip", 1_000)
            .with_xattr("/photos/Trip", "user.picasa.albumid", "summer-2012")
            .with_xattr("/photos/Trip", "user.picasa.summary", "Two weeks in Crete"),
    );

    let (id, record) = RuleSet::xattr_tagged()
        .observe_directory(&context(&fs, "/photos/Trip"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(id, "summer-2012");
    assert_eq!(record, AlbumRecord::new("Trip", 1_000, "Two weeks in Crete"));
}

#[tokio::test]
async fn test_xattr_tagged_falls_back_to_directory_name() {
    let fs = Arc::new(FakeFileSystem::default().with_dir("/photos/Trip", 1_000));

    let (id, _) = RuleSet::xattr_tagged()
        .observe_directory(&context(&fs, "/photos/Trip"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(id, "Trip");
}

#[tokio::test]
async fn test_xattr_tagged_image_caption_and_keywords() {
    let fs = Arc::new(
        FakeFileSystem::default()
            .with_file("/photos/Trip/IMG1.jpg", 10, 2_000)
            .with_xattr("/photos/Trip/IMG1.jpg", "user.caption", "Harbour at dusk")
            .with_xattr("/photos/Trip/IMG1.jpg", "user.keywords", "sea, boats,  dusk"),
    );

    let (id, record) = RuleSet::xattr_tagged()
        .observe_file("summer-2012", &context(&fs, "/photos/Trip/IMG1.jpg"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(id, "IMG1");
    assert_eq!(record.caption, "Harbour at dusk");
    assert_eq!(record.keywords, Keywords::parse("boats,dusk,sea"));
}

#[tokio::test]
async fn test_shotwell_requires_event_id() {
    let fs = Arc::new(
        FakeFileSystem::default()
            .with_dir("/photos/2012/06", 1_000)
            .with_dir("/photos/2012/07", 1_000)
            .with_xattr("/photos/2012/07", "user.shotwell.event_id", "event-7")
            .with_xattr("/photos/2012/07", "user.shotwell.event_comment", "Wedding"),
    );
    let rules = RuleSet::shotwell();

    let untagged = rules
        .observe_directory(&context(&fs, "/photos/2012/06"))
        .await
        .unwrap();
    let tagged = rules
        .observe_directory(&context(&fs, "/photos/2012/07"))
        .await
        .unwrap();

    assert!(untagged.is_none());
    assert_eq!(
        tagged,
        Some(("event-7".to_string(), AlbumRecord::new("07", 1_000, "Wedding")))
    );
}

#[tokio::test]
async fn test_shotwell_photo_and_video_ids() {
    let fs = Arc::new(
        FakeFileSystem::default()
            .with_file("/photos/07/IMG1.jpg", 10, 1)
            .with_xattr("/photos/07/IMG1.jpg", "user.shotwell.transform_id", "42")
            .with_xattr("/photos/07/IMG1.jpg", "user.shotwell.title", "First dance")
            .with_xattr("/photos/07/IMG1.jpg", "user.shotwell.comment", "Taken by Sam")
            .with_file("/photos/07/MVI2.mov", 10, 1)
            .with_xattr("/photos/07/MVI2.mov", "user.shotwell.transform_id", "43")
            .with_file("/photos/07/IMG3.jpg", 10, 1),
    );
    let rules = RuleSet::shotwell();

    let (photo_id, photo) = rules
        .observe_file("event-7", &context(&fs, "/photos/07/IMG1.jpg"))
        .await
        .unwrap()
        .unwrap();
    let (video_id, _) = rules
        .observe_file("event-7", &context(&fs, "/photos/07/MVI2.mov"))
        .await
        .unwrap()
        .unwrap();
    let untagged = rules
        .observe_file("event-7", &context(&fs, "/photos/07/IMG3.jpg"))
        .await
        .unwrap();

    assert_eq!(photo_id, "42");
    assert_eq!(photo.caption, "First dance\nTaken by Sam");
    assert_eq!(video_id, "v:43");
    assert!(untagged.is_none());
}

#[tokio::test]
async fn test_context_reads_each_attribute_once() {
    let fs = Arc::new(
        FakeFileSystem::default()
            .with_file("/photos/Trip/IMG1.jpg", 10, 2_000)
            .with_xattr("/photos/Trip/IMG1.jpg", "user.caption", "Harbour"),
    );
    let caption = XattrFile {
        caption: vec!["user.caption"],
        ..XattrFile::default()
    };
    let rules = RuleSet::default()
        .with_file_rule(ContentTypeMatcher::images(), caption.clone())
        .with_file_rule(ContentTypeMatcher::exact("image/jpeg"), caption);

    let (_, record) = rules
        .observe_file("Trip", &context(&fs, "/photos/Trip/IMG1.jpg"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.caption, "Harbour");
    assert_eq!(fs.xattr_reads().await, 1);
}

// ============================================================================
// EXIF and source adapter
// ============================================================================

#[tokio::test]
async fn test_exif_caption_from_image_description() {
    let dir = tempfile::tempdir().unwrap();
    let album = dir.path().join("Trip");
    std::fs::create_dir(&album).unwrap();
    std::fs::write(album.join("IMG1.jpg"), jpeg_with_description("Sunset")).unwrap();
    std::fs::write(album.join("IMG2.jpg"), b"not really a jpeg").unwrap();

    let source = RuleBasedSource::new(RuleSet::exif(), Arc::new(TokioFileSystem::new()));

    let (id, record) = source
        .observe_file("Trip", &album.join("IMG1.jpg"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, "IMG1");
    assert_eq!(record.caption, "Sunset");

    // Unreadable EXIF leaves the defaults in place
    let (_, plain) = source
        .observe_file("Trip", &album.join("IMG2.jpg"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plain.caption, "");
}

#[tokio::test]
async fn test_exif_caption_joins_document_name_first() {
    let dir = tempfile::tempdir().unwrap();
    let album = dir.path().join("Trip");
    std::fs::create_dir(&album).unwrap();
    std::fs::write(
        album.join("IMG1.jpg"),
        jpeg_with_ascii_tags(&[(0x010D, "Harbour walk"), (0x010E, "Sunset")]),
    )
    .unwrap();

    let source = RuleBasedSource::new(RuleSet::exif(), Arc::new(TokioFileSystem::new()));
    let (_, record) = source
        .observe_file("Trip", &album.join("IMG1.jpg"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.caption, "Harbour walk\nSunset");
    assert!(record.keywords.is_empty());
}

#[tokio::test]
async fn test_source_reports_stat_failures_as_observation_errors() {
    let fs = Arc::new(FakeFileSystem::default());
    let source = RuleBasedSource::new(RuleSet::default(), fs);

    let result = source.observe_directory(Path::new("/photos/Gone")).await;

    match result {
        Err(SyncError::Observation { path, .. }) => assert_eq!(path, "/photos/Gone"),
        other => panic!("unexpected result {:?}", other),
    }
}
