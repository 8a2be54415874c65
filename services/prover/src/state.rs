//! Shared prover service state.

use attest_prover_core::Prover;
use std::sync::Mutex;

/// State shared across every `/attest` request.
///
/// `prover` is wrapped in a (synchronous) `Mutex` rather than left
/// bare: the TPM is a serial device, so a second `/attest` request
/// arriving while the TPM is mid-Quote must wait rather than race the
/// device handle. The lock is only ever taken from inside
/// `spawn_blocking`, alongside the blocking TPM call itself, so a
/// synchronous lock is the right tool — nothing here holds it across
/// an `.await`.
pub struct AppState {
    pub prover: Mutex<Prover>,
}

impl AppState {
    pub fn new(prover: Prover) -> Self {
        Self {
            prover: Mutex::new(prover),
        }
    }
}
