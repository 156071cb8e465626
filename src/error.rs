//! MirrorLink Error Types

use thiserror::Error;

/// Result type alias for MirrorLink operations
pub type Result<T> = std::result::Result<T, Error>;

/// MirrorLink error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Resolution errors
    #[error("No mirror site matches {0}")]
    NoMatchingSite(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
