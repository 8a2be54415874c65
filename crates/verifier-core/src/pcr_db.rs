//! The reference PCR database: the expected per-platform PCR values an
//! attestation round checks a prover's Quote against.
//!
//! Format recovered from the original `pkg/verifier/FileDB.go`: a text
//! file, one line per PCR, line order is the PCR id. Each line is
//! whitespace-split; the first token is a discarded label, the
//! remaining tokens are individual hex-encoded bytes concatenated into
//! the PCR's 20-byte value.

use crate::error::{VerifierError, VerifierResult};
use attest_quote::Pcr;
use std::path::{Path, PathBuf};

/// Source of the expected PCR state a Quote is checked against.
pub trait PcrSource: Send + Sync {
    /// Load the full expected PCR set, in ascending id order.
    fn load(&self) -> VerifierResult<Vec<Pcr>>;
}

/// Default path the reference PCR database is read from when no
/// override is configured.
pub const DEFAULT_PCR_DB_PATH: &str = "/pcrs";

/// A [`PcrSource`] backed by the `FileDB` text format at a fixed path.
pub struct FileDb {
    path: PathBuf,
}

impl FileDb {
    /// Point a `FileDb` at a specific file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Point a `FileDb` at the default path.
    pub fn default_path() -> Self {
        Self::new(DEFAULT_PCR_DB_PATH)
    }
}

impl PcrSource for FileDb {
    fn load(&self) -> VerifierResult<Vec<Pcr>> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| VerifierError::PcrDb(format!("reading {}: {e}", self.path.display())))?;
        parse(&contents)
    }
}

/// Parse the `FileDB` text format. Malformed hex on any line is fatal
/// for the whole load — a partial PCR database is never used for a
/// verification pass.
fn parse(contents: &str) -> VerifierResult<Vec<Pcr>> {
    let mut pcrs = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        tokens.next().ok_or_else(|| {
            VerifierError::PcrDb(format!("line {line_no}: missing label token"))
        })?;

        let mut value = Vec::new();
        for tok in tokens {
            let byte = u8::from_str_radix(tok, 16).map_err(|_| {
                VerifierError::PcrDb(format!("line {line_no}: invalid hex byte '{tok}'"))
            })?;
            value.push(byte);
        }

        pcrs.push(Pcr::new(line_no as u8, value));
    }
    Ok(pcrs)
}

/// Parse the `FileDB` format directly from a path, without constructing
/// a [`FileDb`] — convenience for ancillary tools (`pcrExtend`-style).
pub fn load_from_path(path: impl AsRef<Path>) -> VerifierResult<Vec<Pcr>> {
    FileDb::new(path.as_ref().to_path_buf()).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_then_hex_bytes() {
        let text = "pcr0 aa bb cc\npcr1 00 01\n";
        let pcrs = parse(text).unwrap();
        assert_eq!(pcrs.len(), 2);
        assert_eq!(pcrs[0].id, 0);
        assert_eq!(pcrs[0].value, vec![0xaa, 0xbb, 0xcc]);
        assert_eq!(pcrs[1].id, 1);
        assert_eq!(pcrs[1].value, vec![0x00, 0x01]);
    }

    #[test]
    fn rejects_invalid_hex() {
        let text = "pcr0 zz\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn pcr_id_is_the_0_based_line_number() {
        let text = "pcr0 aa\npcr1 bb\npcr2 cc\n";
        let pcrs = parse(text).unwrap();
        assert_eq!(pcrs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
