use core_sync::SyncError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to extract metadata: {0}")]
    ExtractionFailed(String),

    #[error("EXIF error: {0}")]
    Exif(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl MetadataError {
    /// Reports the error as a failed observation of `path`
    pub fn into_observation(self, path: &Path) -> SyncError {
        SyncError::Observation {
            path: path.display().to_string(),
            message: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
