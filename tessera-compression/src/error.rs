//! Error types for compression operations

use thiserror::Error;

/// Errors that can occur while configuring or running the gzip stage
#[derive(Error, Debug)]
pub enum CompressionError {
    /// The encoder rejected input or failed to produce output
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Invalid compression level: {0} (must be between {1} and {2})")]
    InvalidLevel(u32, u32, u32),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CompressionError> for tessera_core::Error {
    fn from(err: CompressionError) -> Self {
        tessera_core::Error::Compression(err.to_string())
    }
}
