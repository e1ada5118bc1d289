use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The remote service refused the credentials attached to the request
    #[error("Remote service rejected credentials: {0}")]
    Unauthorized(String),

    /// The remote service throttled the request
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    /// The referenced album or photo does not exist remotely
    #[error("Remote resource not found: {0}")]
    NotFound(String),

    /// The remote service rejected the request payload
    #[error("Remote request rejected (status {status_code}): {message}")]
    Rejected { status_code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure came back from the remote service itself
    pub fn is_remote_response(&self) -> bool {
        matches!(
            self,
            BridgeError::Unauthorized(_)
                | BridgeError::RateLimited { .. }
                | BridgeError::NotFound(_)
                | BridgeError::Rejected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
