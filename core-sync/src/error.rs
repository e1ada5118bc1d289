use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A collaborator call (remote service, transform, file system) failed
    #[error("Bridge error: {0}")]
    Remote(#[from] BridgeError),

    #[error("Image {image_id} references unknown album {album_id}")]
    UnknownAlbum { image_id: String, album_id: String },

    #[error("Image id {image_id} observed in album {first_album} and again in {second_album}")]
    DuplicateImageId {
        image_id: String,
        first_album: String,
        second_album: String,
    },

    #[error("{entity} {id} has no remote handle")]
    MissingRemoteHandle { entity: &'static str, id: String },

    #[error("{entity} {id} has no local record")]
    MissingLocalRecord { entity: &'static str, id: String },

    #[error("Failed to observe {path}: {message}")]
    Observation { path: String, message: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether the error invalidates the whole run rather than one item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::UnknownAlbum { .. }
                | SyncError::DuplicateImageId { .. }
                | SyncError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
