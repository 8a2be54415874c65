//! Core error types shared by the attestation crates.

use thiserror::Error;

/// Error type for the ambient support layer (config loading, mostly).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Generic error, used where no more specific variant applies.
    #[error("core error: {0}")]
    Generic(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("invalid config: {0}")]
    Config(String),
}
