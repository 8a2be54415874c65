//! Verifier configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a running verifier instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Address the verifier's HTTP listener binds to.
    pub address: String,
    /// Port the verifier's HTTP listener binds to.
    pub port: String,
    /// Interval between attestation scheduler rounds.
    #[serde(with = "humantime_duration")]
    pub attestation_interval: Duration,
    /// Owner password handed out via `getNewEdgeInitParameters` for
    /// provers to take TPM ownership with.
    pub owner_password: String,
    /// User (SRK) password handed out alongside the owner password.
    pub user_password: String,
    /// Path to the reference PCR database.
    pub pcr_db_path: PathBuf,
}

mod humantime_duration {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        if secs == 0 {
            return Err(D::Error::custom("attestation_interval must be non-zero"));
        }
        Ok(Duration::from_secs(secs))
    }
}
