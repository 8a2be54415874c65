//! EK certificate parsing (TCG-PC NVRAM framing + lenient ASN.1
//! recovery) and manufacturer root chain verification.

pub mod ek;
pub mod error;

pub use ek::{parse_certificate, strip_nvram_framing, EkCertificate, ManufacturerTrustStore};
pub use error::{PkiError, PkiResult};
