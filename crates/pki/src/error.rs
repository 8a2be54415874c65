//! Error kinds for EK certificate parsing and chain verification.

use thiserror::Error;

/// Errors raised while parsing or verifying an Endorsement Key certificate.
#[derive(Debug, Error)]
pub enum PkiError {
    /// The TCG-PC NVRAM framing header was malformed.
    #[error("malformed NVRAM framing: {0}")]
    MalformedFraming(String),

    /// The certificate bytes could not be parsed as DER/ASN.1, even
    /// after the lenient re-wrap fallback.
    #[error("certificate parse failed: {0}")]
    ParseFailed(String),

    /// The certificate's public key was not an RSA key.
    #[error("certificate public key is not RSA")]
    NotRsaKey,

    /// The certificate bytes supplied were empty.
    #[error("missing certificate bytes")]
    EmptyCertificate,
}

/// Convenience alias for results in this crate.
pub type PkiResult<T> = Result<T, PkiError>;
