//! PCR composite: the canonical byte encoding of a selected set of PCRs
//! that gets hashed into a Quote's digest slot.
//!
//! ```text
//! uint16 size           = 3           (big-endian)
//! uint8[3] bitmap                     (bit i%8 of byte i/8 set iff PCR i selected)
//! uint32 valueSize                    (big-endian, = 20 * popcount(bitmap))
//! uint8[valueSize] concatenatedValues (values sorted ascending by PCR id)
//! ```

use crate::error::{QuoteError, QuoteResult};
use crate::pcr::{Pcr, MAX_PCR_ID};
use sha1::{Digest, Sha1};

const BITMAP_SIZE: usize = 3;
const PCR_VALUE_LEN: usize = 20;
const HEADER_LEN: usize = 2 + BITMAP_SIZE + 4;

/// A built PCR composite: the selection bitmap and the concatenated
/// values of the selected PCRs, in ascending id order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcrComposite {
    bitmap: [u8; BITMAP_SIZE],
    values: Vec<u8>,
}

impl PcrComposite {
    /// Build a composite from a set of PCRs. Rejects ids outside
    /// `[0, 23]` and duplicate ids.
    pub fn build(pcrs: &[Pcr]) -> QuoteResult<Self> {
        let mut sorted: Vec<&Pcr> = pcrs.iter().collect();
        sorted.sort_by_key(|p| p.id);

        let mut bitmap = [0u8; BITMAP_SIZE];
        let mut values = Vec::with_capacity(sorted.len() * PCR_VALUE_LEN);
        let mut seen = [false; (MAX_PCR_ID as usize) + 1];

        for pcr in sorted {
            if pcr.id > MAX_PCR_ID {
                return Err(QuoteError::InvalidPcrId(pcr.id));
            }
            if seen[pcr.id as usize] {
                return Err(QuoteError::DuplicatePcrId(pcr.id));
            }
            seen[pcr.id as usize] = true;

            let byte_index = (pcr.id / 8) as usize;
            let bit_index = pcr.id % 8;
            bitmap[byte_index] |= 1 << bit_index;
            values.extend_from_slice(&pcr.value);
        }

        Ok(Self { bitmap, values })
    }

    /// The 3-byte selection bitmap.
    pub fn bitmap(&self) -> [u8; BITMAP_SIZE] {
        self.bitmap
    }

    /// The concatenated PCR values, ascending by id.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Number of PCRs selected by this composite.
    pub fn selected_count(&self) -> u32 {
        self.bitmap.iter().map(|b| b.count_ones()).sum()
    }

    /// Serialize to the exact TPM 1.2 wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.values.len());
        out.extend_from_slice(&3u16.to_be_bytes());
        out.extend_from_slice(&self.bitmap);
        out.extend_from_slice(&(self.values.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.values);
        out
    }

    /// Parse the exact TPM 1.2 wire encoding back into bitmap + values.
    pub fn from_bytes(buf: &[u8]) -> QuoteResult<Self> {
        if buf.len() < HEADER_LEN {
            return Err(QuoteError::MalformedEncoding {
                expected: HEADER_LEN,
                actual: buf.len(),
            });
        }
        let size = u16::from_be_bytes([buf[0], buf[1]]);
        if size as usize != BITMAP_SIZE {
            return Err(QuoteError::MalformedEncoding {
                expected: BITMAP_SIZE,
                actual: size as usize,
            });
        }
        let mut bitmap = [0u8; BITMAP_SIZE];
        bitmap.copy_from_slice(&buf[2..2 + BITMAP_SIZE]);

        let value_size_offset = 2 + BITMAP_SIZE;
        let value_size = u32::from_be_bytes([
            buf[value_size_offset],
            buf[value_size_offset + 1],
            buf[value_size_offset + 2],
            buf[value_size_offset + 3],
        ]) as usize;

        let values_offset = value_size_offset + 4;
        let expected_total = values_offset + value_size;
        if buf.len() != expected_total {
            return Err(QuoteError::MalformedEncoding {
                expected: expected_total,
                actual: buf.len(),
            });
        }

        let values = buf[values_offset..].to_vec();
        Ok(Self { bitmap, values })
    }

    /// SHA-1 digest of the wire encoding — the value stored in a Quote's
    /// `digest` slot.
    pub fn digest(&self) -> [u8; PCR_VALUE_LEN] {
        let mut hasher = Sha1::new();
        hasher.update(self.to_bytes());
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcr(id: u8, fill: u8) -> Pcr {
        Pcr::new(id, vec![fill; PCR_VALUE_LEN])
    }

    #[test]
    fn round_trip_preserves_bitmap_and_values() {
        for subset in [vec![0u8], vec![7], vec![0, 7, 23], vec![], (0..24).collect()] {
            let pcrs: Vec<Pcr> = subset.iter().map(|&id| pcr(id, id)).collect();
            let built = PcrComposite::build(&pcrs).unwrap();
            let bytes = built.to_bytes();
            let parsed = PcrComposite::from_bytes(&bytes).unwrap();
            assert_eq!(built, parsed);
        }
    }

    #[test]
    fn composite_length_invariant() {
        let pcrs = vec![pcr(0, 1), pcr(7, 2), pcr(23, 3)];
        let composite = PcrComposite::build(&pcrs).unwrap();
        assert_eq!(composite.selected_count(), 3);
        assert_eq!(composite.to_bytes().len(), HEADER_LEN + 3 * PCR_VALUE_LEN);
    }

    #[test]
    fn scenario_s4_bitmap_and_length() {
        let pcrs = vec![pcr(0, 0xAA), pcr(7, 0xBB), pcr(23, 0xCC)];
        let composite = PcrComposite::build(&pcrs).unwrap();
        assert_eq!(composite.bitmap(), [0x81, 0x00, 0x80]);
        assert_eq!(composite.values().len(), 60);
        assert_eq!(composite.to_bytes().len(), 69);
    }

    #[test]
    fn rejects_invalid_and_duplicate_ids() {
        assert_eq!(
            PcrComposite::build(&[pcr(24, 1)]).unwrap_err(),
            QuoteError::InvalidPcrId(24)
        );
        assert_eq!(
            PcrComposite::build(&[pcr(1, 1), pcr(1, 2)]).unwrap_err(),
            QuoteError::DuplicatePcrId(1)
        );
    }
}
