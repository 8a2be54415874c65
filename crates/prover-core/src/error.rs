//! Error kinds for the prover lifecycle, registration, and attestation.

use thiserror::Error;

/// Errors raised by the prover core.
#[derive(Debug, Error)]
pub enum ProverError {
    /// A TPM operation failed.
    #[error(transparent)]
    Tpm(#[from] attest_tpm::TpmError),

    /// The AK file was missing or unreadable after initialization —
    /// a fatal inconsistency, since init is supposed to have written it.
    #[error("ak file inconsistent after init: {0}")]
    AkFileInconsistent(String),

    /// Filesystem error persisting or loading the AK file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The AK file's JSON was malformed.
    #[error("ak file malformed: {0}")]
    AkFileMalformed(#[from] serde_json::Error),

    /// Registration with the verifier failed — either a transport-level
    /// error or a non-2xx response.
    #[error("registration failed: {0}")]
    RegistrationFailed(String),
}

/// Convenience alias for results in this crate.
pub type ProverResult<T> = Result<T, ProverError>;
