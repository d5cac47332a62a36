//! Error types for breathcut
//!
//! Every failure is terminal for the operation that raised it; the session
//! leaves its held buffer untouched when an operation fails.

use thiserror::Error;

/// Main error type for the breathcut engine
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized or corrupt container
    #[error("Format error: {0}")]
    Format(String),

    /// Recognized container with an encoding or bit depth that is not handled
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Operation requires a loaded buffer
    #[error("No audio buffer loaded")]
    NoBuffer,

    /// Removal requested with no segments
    #[error("No breath segments to remove")]
    EmptySegments,

    /// Parameter out of range (sensitivity, durations, segment bounds)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// External decoder failure (non-WAV inputs)
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Background worker panicked or was cancelled by the runtime
    #[error("Worker error: {0}")]
    Worker(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// breathcut-common error
    #[error("Common error: {0}")]
    Common(breathcut_common::Error),
}

impl From<breathcut_common::Error> for Error {
    fn from(err: breathcut_common::Error) -> Self {
        match err {
            breathcut_common::Error::InvalidInput(msg) => Error::InvalidParameter(msg),
            other => Error::Common(other),
        }
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::FormatError(msg) => Error::Format(msg.to_string()),
            hound::Error::Unsupported => {
                Error::UnsupportedFormat("WAV encoding or bit depth not supported".to_string())
            }
            hound::Error::IoError(e) => Error::Format(format!("truncated WAV header: {}", e)),
            other => Error::UnsupportedFormat(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Worker(err.to_string())
    }
}

/// Convenience Result type using breathcut Error
pub type Result<T> = std::result::Result<T, Error>;
