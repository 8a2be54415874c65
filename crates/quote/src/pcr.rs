//! Platform Configuration Register values.

use crate::bytes_base64;
use serde::{Deserialize, Serialize};

/// Highest valid PCR index, inclusive (TPM 1.2 defines PCRs 0..23).
pub const MAX_PCR_ID: u8 = 23;

/// All PCR ids, ascending — the selection a full-platform Quote uses.
pub const ALL_PCRS: [u8; 24] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
];

/// A single PCR: an index and its 20-byte SHA-1 value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pcr {
    /// PCR index, in `[0, 23]`.
    pub id: u8,
    /// 20-byte SHA-1 digest held by this register.
    #[serde(with = "bytes_base64")]
    pub value: Vec<u8>,
}

impl Pcr {
    /// Construct a PCR value, without validating the id range — callers
    /// building a composite are responsible for that check.
    pub fn new(id: u8, value: Vec<u8>) -> Self {
        Self { id, value }
    }
}
