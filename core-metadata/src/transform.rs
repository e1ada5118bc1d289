use crate::content_type::content_type_for;
use async_trait::async_trait;
use bridge_traits::{error::Result, ContentTransform, MediaContent};
use std::path::Path;

/// Uploads files unchanged, labelled with their detected content type
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransform;

#[async_trait]
impl ContentTransform for PassthroughTransform {
    async fn transform(&self, path: &Path) -> Result<MediaContent> {
        Ok(MediaContent::File {
            path: path.to_path_buf(),
            content_type: content_type_for(path).map(str::to_string),
        })
    }
}
