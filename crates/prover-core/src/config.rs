//! Prover configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a single prover instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Logical name announced during EK registration.
    pub name: String,
    /// Path the AK is persisted to / loaded from.
    pub ak_file: PathBuf,
    /// TPM owner password.
    pub owner_password: String,
    /// TPM user (SRK) password.
    pub user_password: String,
    /// Base URL of the verifier, e.g. `http://verifier.example:8080`.
    pub verifier_url: String,
}
