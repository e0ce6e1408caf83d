//! Error types for qrx.

use thiserror::Error;

/// Result type alias using qrx's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for qrx operations.
///
/// A region that fails to decode is NOT represented here: decoders return
/// `Ok(None)` for unreadable crops and the pipeline filters them. These
/// variants are reserved for failures that abort a whole request.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before the pipeline ran (allow-list, empty upload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document bytes could not be rasterized (corrupt PDF, unreadable image)
    #[error("Document decode error: {0}")]
    DocumentDecode(String),

    /// Region detector backend failed
    #[error("Detection error: {0}")]
    Detection(String),

    /// Region decoder backend failed (hard failure, not a decode miss)
    #[error("Decode error: {0}")]
    Decode(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::DocumentDecode(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
