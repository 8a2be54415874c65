//! The TPM 1.2 Quote: a signed attestation binding a PCR composite to a
//! fresh nonce.

use crate::bytes_base64;
use crate::composite::PcrComposite;
use crate::error::{QuoteError, QuoteResult};
use crate::key::PublicKey;
use crate::pcr::Pcr;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// The fixed TPM 1.2 version this system speaks.
pub const QUOTE_VERSION: [u8; 4] = [1, 1, 0, 0];
/// The literal magic bytes a genuine TPM Quote info block carries.
pub const QUOTE_FIXED: [u8; 4] = *b"QUOT";

/// Length of the raw TPM Quote info block: version(4) + fixed(4) +
/// digest(20) + nonceHash(20) = 48 bytes, matching the real TPM 1.2
/// `TPM_QUOTE_INFO` structure and the Go reference implementation's
/// `ParsedQuote` struct.
const RAW_LEN: usize = 48;

/// The decoded view of a Quote's raw info block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedQuote {
    /// Must equal `{1, 1, 0, 0}`.
    #[serde(with = "bytes_base64")]
    pub version: Vec<u8>,
    /// Must equal the ASCII bytes `"QUOT"`.
    #[serde(with = "bytes_base64")]
    pub fixed: Vec<u8>,
    /// `SHA-1(pcrComposite)`.
    #[serde(with = "bytes_base64")]
    pub digest: Vec<u8>,
    /// `SHA-1(challengeNonce)`.
    #[serde(with = "bytes_base64")]
    pub nonce: Vec<u8>,
}

impl ParsedQuote {
    /// Construct directly from a composite digest and a nonce hash.
    pub fn new(digest: [u8; 20], nonce_hash: [u8; 20]) -> Self {
        Self {
            version: QUOTE_VERSION.to_vec(),
            fixed: QUOTE_FIXED.to_vec(),
            digest: digest.to_vec(),
            nonce: nonce_hash.to_vec(),
        }
    }

    /// Encode to the exact wire layout.
    pub fn to_bytes(&self) -> QuoteResult<[u8; RAW_LEN]> {
        if self.version.len() != 4 || self.fixed.len() != 4 {
            return Err(QuoteError::MalformedEncoding {
                expected: 4,
                actual: self.version.len().max(self.fixed.len()),
            });
        }
        if self.digest.len() != 20 || self.nonce.len() != 20 {
            return Err(QuoteError::MalformedEncoding {
                expected: 20,
                actual: self.digest.len().max(self.nonce.len()),
            });
        }
        let mut out = [0u8; RAW_LEN];
        out[0..4].copy_from_slice(&self.version);
        out[4..8].copy_from_slice(&self.fixed);
        out[8..28].copy_from_slice(&self.digest);
        out[28..48].copy_from_slice(&self.nonce);
        Ok(out)
    }

    /// Parse the raw info block into its four fields.
    pub fn from_bytes(raw: &[u8]) -> QuoteResult<Self> {
        if raw.len() != RAW_LEN {
            return Err(QuoteError::MalformedEncoding {
                expected: RAW_LEN,
                actual: raw.len(),
            });
        }
        Ok(Self {
            version: raw[0..4].to_vec(),
            fixed: raw[4..8].to_vec(),
            digest: raw[8..28].to_vec(),
            nonce: raw[28..48].to_vec(),
        })
    }
}

/// A Quote returned by an Attest call: the raw TPM info block, its
/// decoded view, and the AK's signature over `SHA-1(raw)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Quote {
    /// The raw TPM info block, consumed verbatim as the signed message.
    #[serde(with = "bytes_base64")]
    pub raw: Vec<u8>,
    /// Decoded view of `raw`; must equal the result of parsing `raw`.
    pub parsed: ParsedQuote,
    /// RSA-PKCS1v15(SHA-1) signature over `SHA-1(raw)`, signed by the AK.
    #[serde(with = "bytes_base64")]
    pub signature: Vec<u8>,
}

impl Quote {
    /// Build a Quote from its raw block and a signature, deriving `parsed`.
    pub fn new(raw: [u8; RAW_LEN], signature: Vec<u8>) -> QuoteResult<Self> {
        let parsed = ParsedQuote::from_bytes(&raw)?;
        Ok(Self {
            raw: raw.to_vec(),
            parsed,
            signature,
        })
    }

    /// Validate that no required field is empty or all-zero, as the
    /// wire format mandates on deserialization, and that `parsed` is
    /// exactly what parsing `raw` produces — the signature only covers
    /// `raw`, so `parsed` must be re-derived and compared, never trusted
    /// as sent.
    pub fn validate_non_empty(&self) -> QuoteResult<()> {
        let empty_or_zero =
            |b: &[u8]| b.is_empty() || b.iter().all(|&x| x == 0);
        if self.raw.len() != RAW_LEN || empty_or_zero(&self.raw) {
            return Err(QuoteError::MalformedEncoding {
                expected: RAW_LEN,
                actual: self.raw.len(),
            });
        }
        if empty_or_zero(&self.signature) {
            return Err(QuoteError::SignatureInvalid);
        }
        if self.parsed != ParsedQuote::from_bytes(&self.raw)? {
            return Err(QuoteError::ParsedRawMismatch);
        }
        Ok(())
    }

    /// Parse a Quote from JSON, enforcing the non-empty-field rule.
    pub fn from_json(bytes: &[u8]) -> QuoteResult<Self> {
        let quote: Quote = serde_json::from_slice(bytes)
            .map_err(|e| QuoteError::MalformedEncoding {
                expected: 0,
                actual: e.to_string().len(),
            })?;
        quote.validate_non_empty()?;
        Ok(quote)
    }

    /// Verify the signature, nonce binding, and fixed magic against an
    /// AK public key and the original challenge nonce. Succeeds iff all
    /// three checks pass, each with its own distinct error otherwise.
    pub fn verify(&self, ak: &PublicKey, nonce: &[u8]) -> QuoteResult<()> {
        // `VerifyingKey<Sha1>` hashes its input internally, so the
        // message here is `raw` itself, not a pre-hashed digest — the
        // embedded DigestInfo it checks against is SHA-1(raw) exactly
        // once, matching the TPM's own single-hash PKCS1v15 signature.
        let rsa_key = ak.to_rsa()?;
        let verifying_key = VerifyingKey::<Sha1>::new(rsa_key);
        let signature = Signature::try_from(self.signature.as_slice())
            .map_err(|_| QuoteError::SignatureInvalid)?;
        verifying_key
            .verify(&self.raw, &signature)
            .map_err(|_| QuoteError::SignatureInvalid)?;

        let expected_nonce_hash = Sha1::digest(nonce);
        if self.parsed.nonce.as_slice() != expected_nonce_hash.as_slice() {
            return Err(QuoteError::NonceMismatch);
        }

        if self.parsed.fixed.as_slice() != QUOTE_FIXED.as_slice() {
            return Err(QuoteError::FixedMagicMismatch);
        }

        Ok(())
    }

    /// Verify `parsed.digest` equals `SHA-1(pcrComposite(expectedPcrs))`.
    pub fn verify_pcrs(&self, expected: &[Pcr]) -> QuoteResult<()> {
        let composite = PcrComposite::build(expected)?;
        if self.parsed.digest.as_slice() != composite.digest().as_slice() {
            return Err(QuoteError::PcrMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding};
    use rsa::{RsaPrivateKey, RsaPublicKey};

    fn raw_for(nonce: &[u8], digest: [u8; 20]) -> [u8; RAW_LEN] {
        let nonce_hash = Sha1::digest(nonce);
        let mut raw = [0u8; RAW_LEN];
        raw[0..4].copy_from_slice(&QUOTE_VERSION);
        raw[4..8].copy_from_slice(&QUOTE_FIXED);
        raw[8..28].copy_from_slice(&digest);
        raw[28..48].copy_from_slice(&nonce_hash);
        raw
    }

    fn keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = private.to_public_key();
        (private, public)
    }

    #[test]
    fn scenario_s1_quote_verifies() {
        let nonce = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let nonce_hash = Sha1::digest(nonce);
        assert_eq!(
            hex::encode(nonce_hash),
            "7037807198c22a7d2b0807371d763779a84fdfcf"
        );

        let (private, public) = keypair();
        let raw = raw_for(&nonce, [0u8; 20]);
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::<Sha1>::new(private);
        let signature = signing_key.sign_with_rng(&mut rng, &raw);

        let ak = PublicKey::new(public.n().clone(), public.e().to_string().parse().unwrap());
        let quote = Quote::new(raw, signature.to_vec()).unwrap();
        assert!(quote.verify(&ak, &nonce).is_ok());
    }

    #[test]
    fn scenario_s2_nonce_mismatch() {
        let nonce = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let (private, public) = keypair();
        let raw = raw_for(&nonce, [0u8; 20]);
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::<Sha1>::new(private);
        let signature = signing_key.sign_with_rng(&mut rng, &raw);

        let ak = PublicKey::new(public.n().clone(), public.e().to_string().parse().unwrap());
        let quote = Quote::new(raw, signature.to_vec()).unwrap();
        let wrong_nonce = [0x00u8; 8];
        assert_eq!(quote.verify(&ak, &wrong_nonce), Err(QuoteError::NonceMismatch));
    }

    #[test]
    fn scenario_s3_fixed_magic_mismatch() {
        let nonce = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let (private, public) = keypair();
        let mut raw = raw_for(&nonce, [0u8; 20]);
        raw[4..8].copy_from_slice(b"XXXX");
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::<Sha1>::new(private);
        let signature = signing_key.sign_with_rng(&mut rng, &raw);

        let ak = PublicKey::new(public.n().clone(), public.e().to_string().parse().unwrap());
        let quote = Quote::new(raw, signature.to_vec()).unwrap();
        assert_eq!(
            quote.verify(&ak, &nonce),
            Err(QuoteError::FixedMagicMismatch)
        );
    }

    #[test]
    fn rejects_empty_signature_on_deserialize() {
        let nonce = [0u8; 8];
        let raw = raw_for(&nonce, [0u8; 20]);
        let quote = Quote::new(raw, vec![]).unwrap();
        assert!(quote.validate_non_empty().is_err());
    }

    #[test]
    fn rejects_parsed_view_that_disagrees_with_raw() {
        // A Quote whose signed `raw` commits to one nonce/digest but whose
        // `parsed` claims a different one must never pass from_json, since
        // verify()/verify_pcrs() trust `parsed` and the signature only
        // covers `raw`.
        let nonce = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let (private, _public) = keypair();
        let raw = raw_for(&nonce, [0u8; 20]);
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::<Sha1>::new(private);
        let signature = signing_key.sign_with_rng(&mut rng, &raw);

        let mut quote = Quote::new(raw, signature.to_vec()).unwrap();
        // Tamper with parsed to claim a different nonce than the one raw
        // actually commits to, leaving raw and signature untouched.
        quote.parsed.nonce = Sha1::digest([0x99u8; 8]).to_vec();

        let bytes = serde_json::to_vec(&quote).unwrap();
        assert_eq!(
            Quote::from_json(&bytes),
            Err(QuoteError::ParsedRawMismatch)
        );
    }
}
