//! # Observation Rules
//!
//! Maps a directory to an album record and a file to an image record.
//!
//! ## Overview
//!
//! A [`RuleSet`] holds album rules and content-type matched file rules. Every
//! rule returns a partial candidate; candidates are merged in rule order so
//! later non-empty fields override earlier ones. The merge starts from the
//! defaults:
//!
//! - album: title = directory name, comment empty, timestamp = mtime
//! - image: caption empty, no keywords, timestamp = mtime
//!
//! No default id is supplied. A directory or file whose merged candidate has
//! no id, or that a rule vetoed, is not managed.
//!
//! ## Presets
//!
//! | Preset                     | Album id                    | Image id                  |
//! |----------------------------|-----------------------------|---------------------------|
//! | [`RuleSet::default`]       | directory name              | file stem                 |
//! | [`RuleSet::xattr_tagged`]  | `user.picasa.albumid` or name | file stem               |
//! | [`RuleSet::exif`]          | directory name              | file stem                 |
//! | [`RuleSet::shotwell`]      | `user.shotwell.event_id`    | `user.shotwell.transform_id` |
//!
//! Videos of 100 MiB or more are skipped by every preset.
//!
//! ## Usage
//!
//! ```ignore
//! let rules = RuleSet::default()
//!     .with_file_rule(ContentTypeMatcher::exact("image/jpeg"), ExifFile::default());
//! let observed = rules.observe_file("trip", &ctx).await?;
//! ```

use crate::content_type::ContentTypeMatcher;
use crate::context::{ExifFields, MetadataContext};
use crate::error::Result;
use async_trait::async_trait;
use core_sync::{AlbumRecord, ImageRecord, Keywords};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Upload limit for video files
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

pub const XATTR_PICASA_ALBUM_ID: &str = "user.picasa.albumid";
pub const XATTR_PICASA_SUMMARY: &str = "user.picasa.summary";
pub const XATTR_CAPTION: &str = "user.caption";
pub const XATTR_KEYWORDS: &str = "user.keywords";

pub const XATTR_SHOTWELL_EVENT_ID: &str = "user.shotwell.event_id";
pub const XATTR_SHOTWELL_EVENT_COMMENT: &str = "user.shotwell.event_comment";
pub const XATTR_SHOTWELL_TRANSFORM_ID: &str = "user.shotwell.transform_id";
pub const XATTR_SHOTWELL_TITLE: &str = "user.shotwell.title";
pub const XATTR_SHOTWELL_COMMENT: &str = "user.shotwell.comment";
pub const XATTR_SHOTWELL_KEYWORDS: &str = "user.shotwell.keywords";

// ============================================================================
// Candidates
// ============================================================================

fn override_text(current: &mut Option<String>, later: Option<String>) {
    if let Some(value) = later.filter(|v| !v.is_empty()) {
        *current = Some(value);
    }
}

/// Partial album record produced by one rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumCandidate {
    pub id: Option<String>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub timestamp: Option<i64>,
}

impl AlbumCandidate {
    pub fn merge(&mut self, later: AlbumCandidate) {
        override_text(&mut self.id, later.id);
        override_text(&mut self.title, later.title);
        override_text(&mut self.comment, later.comment);
        if later.timestamp.is_some() {
            self.timestamp = later.timestamp;
        }
    }

    /// The observed album, or `None` when no rule supplied an id
    pub fn into_observation(self) -> Option<(String, AlbumRecord)> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let record = AlbumRecord::new(
            self.title.unwrap_or_default(),
            self.timestamp.unwrap_or_default(),
            self.comment.unwrap_or_default(),
        );
        Some((id, record))
    }
}

/// Partial image record produced by one rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCandidate {
    pub id: Option<String>,
    pub caption: Option<String>,
    pub keywords: Option<Keywords>,
    pub timestamp: Option<i64>,
    /// Vetoes the file regardless of other rules
    pub skip: bool,
}

impl ImageCandidate {
    pub fn skipped() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }

    pub fn merge(&mut self, later: ImageCandidate) {
        override_text(&mut self.id, later.id);
        override_text(&mut self.caption, later.caption);
        if let Some(keywords) = later.keywords.filter(|k| !k.is_empty()) {
            self.keywords = Some(keywords);
        }
        if later.timestamp.is_some() {
            self.timestamp = later.timestamp;
        }
        self.skip |= later.skip;
    }

    /// The observed image in album `album_id`, or `None` when skipped
    pub fn into_observation(self, album_id: &str) -> Option<(String, ImageRecord)> {
        if self.skip {
            return None;
        }
        let id = self.id.filter(|id| !id.is_empty())?;
        let record = ImageRecord::new(
            album_id,
            self.timestamp.unwrap_or_default(),
            self.caption.unwrap_or_default(),
            self.keywords.unwrap_or_default(),
        );
        Some((id, record))
    }
}

/// Joins the present values with `separator`, dropping repeats
pub fn join_distinct(
    values: impl IntoIterator<Item = Option<String>>,
    separator: &str,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for value in values.into_iter().flatten() {
        if !value.is_empty() && !parts.contains(&value) {
            parts.push(value);
        }
    }
    (!parts.is_empty()).then(|| parts.join(separator))
}

// ============================================================================
// Rule traits
// ============================================================================

/// Contributes album fields for a directory
#[async_trait]
pub trait AlbumRule: Send + Sync {
    async fn extract(&self, ctx: &MetadataContext) -> Result<AlbumCandidate>;
}

/// Contributes image fields for a file
#[async_trait]
pub trait FileRule: Send + Sync {
    async fn extract(&self, ctx: &MetadataContext) -> Result<ImageCandidate>;
}

// ============================================================================
// Built-in rules
// ============================================================================

/// Album id = directory name
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryName;

#[async_trait]
impl AlbumRule for DirectoryName {
    async fn extract(&self, ctx: &MetadataContext) -> Result<AlbumCandidate> {
        Ok(AlbumCandidate {
            id: Some(ctx.basename()),
            ..AlbumCandidate::default()
        })
    }
}

/// Album id and comment from extended attributes on the directory
#[derive(Debug, Clone, Default)]
pub struct XattrAlbum {
    pub id: Option<&'static str>,
    pub comment: Option<&'static str>,
}

#[async_trait]
impl AlbumRule for XattrAlbum {
    async fn extract(&self, ctx: &MetadataContext) -> Result<AlbumCandidate> {
        let mut candidate = AlbumCandidate::default();
        if let Some(name) = self.id {
            candidate.id = ctx.xattr(name).await;
        }
        if let Some(name) = self.comment {
            candidate.comment = ctx.xattr(name).await;
        }
        Ok(candidate)
    }
}

/// Image id = file name without extension
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStem;

#[async_trait]
impl FileRule for FileStem {
    async fn extract(&self, ctx: &MetadataContext) -> Result<ImageCandidate> {
        Ok(ImageCandidate {
            id: Some(ctx.stem()),
            ..ImageCandidate::default()
        })
    }
}

/// Skips files of `max_bytes` or more
#[derive(Debug, Clone, Copy)]
pub struct MaxSize {
    pub max_bytes: u64,
}

#[async_trait]
impl FileRule for MaxSize {
    async fn extract(&self, ctx: &MetadataContext) -> Result<ImageCandidate> {
        if ctx.size().await? >= self.max_bytes {
            debug!(path = ?ctx.path(), limit = self.max_bytes, "File too large");
            return Ok(ImageCandidate::skipped());
        }
        Ok(ImageCandidate::default())
    }
}

/// Image fields from extended attributes on the file
///
/// Caption attributes are joined with newlines. `id_prefix` is prepended to a
/// found id, so videos and stills can share an id space.
#[derive(Debug, Clone, Default)]
pub struct XattrFile {
    pub id: Option<&'static str>,
    pub id_prefix: &'static str,
    pub caption: Vec<&'static str>,
    pub keywords: Option<&'static str>,
}

#[async_trait]
impl FileRule for XattrFile {
    async fn extract(&self, ctx: &MetadataContext) -> Result<ImageCandidate> {
        let mut candidate = ImageCandidate::default();

        if let Some(name) = self.id {
            candidate.id = ctx
                .xattr(name)
                .await
                .map(|id| format!("{}{}", self.id_prefix, id));
        }

        let mut captions = Vec::with_capacity(self.caption.len());
        for name in &self.caption {
            captions.push(ctx.xattr(name).await);
        }
        candidate.caption = join_distinct(captions, "\n");

        if let Some(name) = self.keywords {
            candidate.keywords = ctx.xattr(name).await.map(|v| Keywords::parse(&v));
        }

        Ok(candidate)
    }
}

/// EXIF text field contributing to a caption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifCaption {
    DocumentName,
    ImageDescription,
    UserComment,
}

impl ExifCaption {
    fn read(self, exif: &ExifFields) -> Option<String> {
        match self {
            ExifCaption::DocumentName => exif.document_name.clone(),
            ExifCaption::ImageDescription => exif.image_description.clone(),
            ExifCaption::UserComment => exif.user_comment.clone(),
        }
    }
}

/// Caption joined from EXIF text fields in `caption` order; optionally the
/// timestamp from `DateTimeOriginal`
///
/// Only EXIF is read. XMP titles and keywords (`dc:subject`,
/// `digiKam:TagsList`) are not carried over, so this rule never sets keywords.
#[derive(Debug, Clone)]
pub struct ExifFile {
    pub caption: Vec<ExifCaption>,
    pub date_taken: bool,
}

impl Default for ExifFile {
    fn default() -> Self {
        Self {
            caption: vec![
                ExifCaption::DocumentName,
                ExifCaption::UserComment,
                ExifCaption::ImageDescription,
            ],
            date_taken: true,
        }
    }
}

#[async_trait]
impl FileRule for ExifFile {
    async fn extract(&self, ctx: &MetadataContext) -> Result<ImageCandidate> {
        let Some(exif) = ctx.exif().await else {
            return Ok(ImageCandidate::default());
        };

        Ok(ImageCandidate {
            caption: join_distinct(self.caption.iter().map(|field| field.read(exif)), "\n"),
            timestamp: if self.date_taken {
                exif.date_time_original
            } else {
                None
            },
            ..ImageCandidate::default()
        })
    }
}

// ============================================================================
// Rule sets
// ============================================================================

struct MatchedRule {
    matcher: ContentTypeMatcher,
    rule: Arc<dyn FileRule>,
}

/// Album rules plus ordered, content-type matched file rules
#[derive(Clone)]
pub struct RuleSet {
    album_rules: Vec<Arc<dyn AlbumRule>>,
    file_rules: Vec<Arc<MatchedRule>>,
}

impl RuleSet {
    /// A rule set with no rules; nothing is managed until rules are added
    pub fn empty() -> Self {
        Self {
            album_rules: Vec::new(),
            file_rules: Vec::new(),
        }
    }

    pub fn with_album_rule(mut self, rule: impl AlbumRule + 'static) -> Self {
        self.album_rules.push(Arc::new(rule));
        self
    }

    pub fn with_file_rule(
        mut self,
        matcher: ContentTypeMatcher,
        rule: impl FileRule + 'static,
    ) -> Self {
        self.file_rules.push(Arc::new(MatchedRule {
            matcher,
            rule: Arc::new(rule),
        }));
        self
    }

    /// Directory name and file stem ids; large videos skipped
    pub fn standard() -> Self {
        Self::empty()
            .with_album_rule(DirectoryName)
            .with_file_rule(ContentTypeMatcher::images(), FileStem)
            .with_file_rule(ContentTypeMatcher::videos(), FileStem)
            .with_file_rule(
                ContentTypeMatcher::videos(),
                MaxSize {
                    max_bytes: MAX_VIDEO_BYTES,
                },
            )
    }

    /// Standard ids, overridden by `user.picasa.*` directory attributes;
    /// captions and keywords from `user.caption` and `user.keywords`
    pub fn xattr_tagged() -> Self {
        let tags = XattrFile {
            caption: vec![XATTR_CAPTION],
            keywords: Some(XATTR_KEYWORDS),
            ..XattrFile::default()
        };

        Self::standard()
            .with_album_rule(XattrAlbum {
                id: Some(XATTR_PICASA_ALBUM_ID),
                comment: Some(XATTR_PICASA_SUMMARY),
            })
            .with_file_rule(ContentTypeMatcher::images(), tags.clone())
            .with_file_rule(ContentTypeMatcher::videos(), tags)
    }

    /// Standard ids with captions from EXIF; JPEG timestamps from the date taken
    pub fn exif() -> Self {
        Self::standard()
            .with_file_rule(ContentTypeMatcher::exact("image/jpeg"), ExifFile::default())
            .with_file_rule(
                ContentTypeMatcher::exact("image/tiff"),
                ExifFile {
                    caption: vec![
                        ExifCaption::DocumentName,
                        ExifCaption::ImageDescription,
                        ExifCaption::UserComment,
                    ],
                    date_taken: false,
                },
            )
    }

    /// Ids, captions and keywords from the attributes Shotwell writes
    ///
    /// Directories without an event id and files without a transform id are
    /// not managed. Video ids are prefixed with `v:`.
    pub fn shotwell() -> Self {
        let photo = XattrFile {
            id: Some(XATTR_SHOTWELL_TRANSFORM_ID),
            id_prefix: "",
            caption: vec![XATTR_SHOTWELL_TITLE, XATTR_SHOTWELL_COMMENT],
            keywords: Some(XATTR_SHOTWELL_KEYWORDS),
        };
        let video = XattrFile {
            id_prefix: "v:",
            ..photo.clone()
        };

        Self::empty()
            .with_album_rule(XattrAlbum {
                id: Some(XATTR_SHOTWELL_EVENT_ID),
                comment: Some(XATTR_SHOTWELL_EVENT_COMMENT),
            })
            .with_file_rule(ContentTypeMatcher::images(), photo)
            .with_file_rule(ContentTypeMatcher::videos(), video)
            .with_file_rule(
                ContentTypeMatcher::videos(),
                MaxSize {
                    max_bytes: MAX_VIDEO_BYTES,
                },
            )
    }

    /// Applies the album rules to a directory
    pub async fn observe_directory(
        &self,
        ctx: &MetadataContext,
    ) -> Result<Option<(String, AlbumRecord)>> {
        let mut candidate = AlbumCandidate {
            id: None,
            title: Some(ctx.basename()),
            comment: None,
            timestamp: Some(ctx.mtime().await?),
        };

        for rule in &self.album_rules {
            candidate.merge(rule.extract(ctx).await?);
        }

        Ok(candidate.into_observation())
    }

    /// Applies the matching file rules to a file in album `album_id`
    ///
    /// Files matched by no rule are not managed.
    pub async fn observe_file(
        &self,
        album_id: &str,
        ctx: &MetadataContext,
    ) -> Result<Option<(String, ImageRecord)>> {
        let content_type = ctx.content_type();
        let matched: Vec<&Arc<MatchedRule>> = self
            .file_rules
            .iter()
            .filter(|entry| entry.matcher.matches(content_type))
            .collect();

        if matched.is_empty() {
            return Ok(None);
        }

        let mut candidate = ImageCandidate {
            timestamp: Some(ctx.mtime().await?),
            ..ImageCandidate::default()
        };

        for entry in matched {
            candidate.merge(entry.rule.extract(ctx).await?);
            if candidate.skip {
                break;
            }
        }

        Ok(candidate.into_observation(album_id))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("album_rules", &self.album_rules.len())
            .field(
                "file_rules",
                &self
                    .file_rules
                    .iter()
                    .map(|entry| &entry.matcher)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
