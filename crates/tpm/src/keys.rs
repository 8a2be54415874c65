//! Wire and on-disk representations of the Attestation Identity Key and
//! Endorsement Key.

use crate::error::{TpmError, TpmResult};
use attest_pki::EkCertificate;
use attest_quote::PublicKey;
use serde::{Deserialize, Serialize};

/// An Attestation Identity Key: the public half plus the TPM-opaque
/// blob needed to reload the corresponding private key on future Quote
/// calls. Persisted to disk as `{"PublicKey": {...}, "Blob": "<base64>"}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttestationKey {
    /// Public half of the AK keypair.
    pub public_key: PublicKey,
    /// Opaque TPM key blob required to load the private half.
    #[serde(with = "attest_quote_bytes")]
    pub blob: Vec<u8>,
}

impl AttestationKey {
    /// Construct an AK record.
    pub fn new(public_key: PublicKey, blob: Vec<u8>) -> Self {
        Self { public_key, blob }
    }

    /// Validate that every required field is present and non-empty, as
    /// the on-disk/wire format mandates on load.
    pub fn validate_non_empty(&self) -> TpmResult<()> {
        if self.blob.is_empty() {
            return Err(TpmError::KeyMaterialInvalid(
                "AK blob is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// An Endorsement Key: its certified RSA public key plus the
/// manufacturer-issued certificate it was read from.
#[derive(Clone, Debug)]
pub struct EndorsementKey {
    certificate: EkCertificate,
}

impl EndorsementKey {
    /// Wrap a parsed EK certificate.
    pub fn new(certificate: EkCertificate) -> Self {
        Self { certificate }
    }

    /// The EK's RSA public key.
    pub fn public_key(&self) -> &PublicKey {
        self.certificate.public_key()
    }

    /// The underlying parsed certificate.
    pub fn certificate(&self) -> &EkCertificate {
        &self.certificate
    }
}

/// `{"certificate": <DER bytes>}` wire encoding for an Endorsement Key.
#[derive(Serialize, Deserialize)]
pub struct EndorsementKeyWire {
    /// Raw DER certificate bytes.
    #[serde(with = "attest_quote_bytes", rename = "certificate")]
    pub certificate: Vec<u8>,
}

impl EndorsementKeyWire {
    /// Build the wire form from a parsed EK.
    pub fn from_ek(ek: &EndorsementKey) -> Self {
        Self {
            certificate: ek.certificate.der().to_vec(),
        }
    }

    /// Parse the wire form back into a validated EK, rejecting empty
    /// certificate bytes before parsing.
    pub fn into_ek(self) -> TpmResult<EndorsementKey> {
        if self.certificate.is_empty() {
            return Err(TpmError::KeyMaterialInvalid(
                "missing required fields".to_string(),
            ));
        }
        let parsed = attest_pki::parse_certificate(&self.certificate)?;
        Ok(EndorsementKey::new(parsed))
    }
}

mod attest_quote_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(D::Error::custom)
    }
}
