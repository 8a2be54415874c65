//! Error kinds for TPM adapter operations.

use thiserror::Error;

/// Errors raised by a [`crate::TpmAdapter`] implementation.
#[derive(Debug, Error)]
pub enum TpmError {
    /// The TPM device could not be opened or a command failed at the
    /// transport level. Fatal at init.
    #[error("tpm unavailable: {0}")]
    Unavailable(String),

    /// `take_ownership` was called on an already-owned TPM.
    #[error("tpm already owned")]
    AlreadyOwned,

    /// An operation requiring ownership was attempted before it.
    #[error("tpm not owned")]
    NotOwned,

    /// AK/EK key material was malformed.
    #[error("invalid key material: {0}")]
    KeyMaterialInvalid(String),

    /// EK certificate parsing or chain validation failed.
    #[error(transparent)]
    Pki(#[from] attest_pki::PkiError),

    /// Quote construction or codec failure.
    #[error(transparent)]
    Quote(#[from] attest_quote::QuoteError),

    /// Underlying filesystem error (AK persistence, PCR db reads done
    /// by callers of this crate, not this crate itself, but surfaced
    /// the same way for convenience).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results in this crate.
pub type TpmResult<T> = Result<T, TpmError>;
