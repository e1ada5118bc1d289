//! # Local Metadata Module
//!
//! Turns library directories and files into album and image observations.
//!
//! ## Overview
//!
//! This module handles:
//! - Content type detection by extension
//! - Lazily read file facts: stat, extended attributes, EXIF
//! - Rule sets mapping those facts to album and image records, with presets
//!   for plain directories, `user.*` tagged files, EXIF captions and Shotwell
//! - The pass-through upload transform

pub mod content_type;
pub mod context;
pub mod error;
pub mod rules;
pub mod source;
pub mod transform;

pub use content_type::{content_type_for, ContentTypeMatcher};
pub use context::{ExifFields, MetadataContext};
pub use error::{MetadataError, Result};
pub use rules::{
    AlbumCandidate, AlbumRule, DirectoryName, ExifCaption, ExifFile, FileRule, FileStem,
    ImageCandidate, MaxSize, RuleSet, XattrAlbum, XattrFile,
};
pub use source::RuleBasedSource;
pub use transform::PassthroughTransform;
