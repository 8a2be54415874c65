//! Error kinds for the prover registry, challenge generation, and the
//! attestation scheduler.

use thiserror::Error;

/// Errors raised by the verifier core.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// `registerNewEK` was called with no EK attached to the prover record.
    #[error("missing EK on registration")]
    MissingEk,

    /// `registerNewAK` was called with no AK attached to the prover record.
    #[error("missing AK on registration")]
    MissingAk,

    /// The EK or AK key was already present in the registry.
    #[error("duplicate registration for key {0}")]
    DuplicateRegistration(String),

    /// `registerNewAK` referenced an EK that was never registered.
    #[error("no prover registered for this EK")]
    ProverNotFound,

    /// The EK certificate failed chain verification against the
    /// manufacturer trust store.
    #[error(transparent)]
    Pki(#[from] attest_pki::PkiError),

    /// Quote verification or PCR-composite construction failed.
    #[error(transparent)]
    Quote(#[from] attest_quote::QuoteError),

    /// A challenge was generated or supplied as an empty nonce.
    #[error("empty challenge nonce")]
    EmptyNonce,

    /// The attestation POST failed at the network layer, or the
    /// prover returned a non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The prover's response body could not be decoded as a Quote.
    #[error("malformed quote response: {0}")]
    MalformedResponse(String),

    /// The PCR reference database could not be read or parsed.
    #[error("pcr reference db error: {0}")]
    PcrDb(String),
}

/// Convenience alias for results in this crate.
pub type VerifierResult<T> = Result<T, VerifierError>;
