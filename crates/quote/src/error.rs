//! Error kinds for PCR composite construction and Quote verification.

use thiserror::Error;

/// Errors raised while building or verifying the TPM 1.2 Quote structures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    /// A PCR id outside `[0, 24)` was supplied to `PcrComposite::build`.
    #[error("invalid PCR id: {0}")]
    InvalidPcrId(u8),

    /// The same PCR id appeared twice in a composite build request.
    #[error("duplicate PCR id: {0}")]
    DuplicatePcrId(u8),

    /// A byte buffer being parsed had the wrong length for its structure.
    #[error("malformed encoding: expected {expected} bytes, got {actual}")]
    MalformedEncoding {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length encountered.
        actual: usize,
    },

    /// RSA public key material was invalid (bad modulus/exponent pair).
    #[error("invalid key material: {0}")]
    KeyMaterialInvalid(String),

    /// The Quote's RSA-PKCS1v15(SHA-1) signature did not verify.
    #[error("invalid quote signature")]
    SignatureInvalid,

    /// `parsed.nonceHash` did not match `SHA-1(nonce)`.
    #[error("nonce mismatch")]
    NonceMismatch,

    /// `parsed.fixed` was not the literal bytes `"QUOT"`.
    #[error("fixed magic mismatch")]
    FixedMagicMismatch,

    /// `parsed.digest` did not match `SHA-1(pcrComposite(expected))`.
    #[error("pcr mismatch")]
    PcrMismatch,

    /// `parsed` did not equal `ParsedQuote::from_bytes(&raw)` — the two
    /// views of the Quote disagreed, which would let a signed `raw`
    /// commit to different fields than the ones actually checked.
    #[error("parsed view does not match raw bytes")]
    ParsedRawMismatch,
}

/// Convenience alias for results in this crate.
pub type QuoteResult<T> = Result<T, QuoteError>;
