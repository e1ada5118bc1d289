use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A setting is missing or has an unusable value
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bridge implementation was neither supplied nor available by default
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global tracing subscriber could not be installed
    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl Error {
    /// Whether the error can be fixed by changing the configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::CapabilityMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
