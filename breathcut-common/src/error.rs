//! Common error types for breathcut

use thiserror::Error;

/// Common result type for breathcut operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across the breathcut crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
