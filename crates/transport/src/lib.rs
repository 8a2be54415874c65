//! Wire envelopes for the four attestation endpoints. No protocol logic
//! lives here — these are pure (de)serializable request/response shapes
//! shared by both the `attest-prover` and `attest-verifier` binaries.

use attest_quote::Quote;
use attest_tpm::{AttestationKey, EndorsementKeyWire};
use serde::{Deserialize, Serialize};

/// Response body for `GET /getNewEdgeInitParameters`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitializationParams {
    /// Owner password a new prover should take ownership with.
    pub owner_password: String,
    /// User (SRK) password a new prover should take ownership with.
    pub user_password: String,
}

/// Request body for `POST /registerNewEK`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterEkRequest {
    /// Logical prover name.
    pub name: String,
    /// Network host the prover can be reached at.
    pub endpoint: String,
    /// Port the prover's `/attest` endpoint listens on.
    pub port: String,
    /// The prover's Endorsement Key.
    pub ek: EndorsementKeyWire,
}

/// Request body for `POST /registerNewAK`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterAkRequest {
    /// The prover's Endorsement Key (must already be registered).
    pub ek: EndorsementKeyWire,
    /// The prover's Attestation Identity Key.
    pub ak: AttestationKey,
}

/// Request body for `POST /attest`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttestRequest {
    /// The challenge nonce, base64-encoded on the wire.
    #[serde(with = "nonce_base64")]
    pub nonce: Vec<u8>,
}

/// Response body for `POST /attest`: a serialized [`Quote`].
pub type AttestResponse = Quote;

mod nonce_base64 {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attest_request_round_trips_through_json() {
        let req = AttestRequest {
            nonce: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: AttestRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.nonce, parsed.nonce);
    }
}
