//! Bit-exact TPM 1.2 Quote and PCR composite codec, plus the
//! cryptographic verification primitives (RSA-PKCS1v15/SHA-1) used to
//! check a Quote against an Attestation Identity Key and an expected
//! PCR state.

pub mod composite;
pub mod error;
pub mod key;
pub mod pcr;
pub mod quote;

pub use composite::PcrComposite;
pub use error::{QuoteError, QuoteResult};
pub use key::PublicKey;
pub use pcr::{Pcr, ALL_PCRS};
pub use quote::{ParsedQuote, Quote};

/// Serde helper: (de)serialize `Vec<u8>`/`[u8; N]`-like byte buffers as
/// base64 strings, matching the JSON byte-array convention used across
/// every wire type in this system.
pub(crate) mod bytes_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: AsRef<[u8]>>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(D::Error::custom)
    }
}
