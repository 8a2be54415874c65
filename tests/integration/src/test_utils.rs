//! Shared fixtures for the handshake/scenario/scheduler integration tests.

use attest_pki::ManufacturerTrustStore;
use attest_prover_core::{Prover, ProverConfig};
use attest_tpm::{StubTpm, TpmAdapter};
use attest_verifier_core::{Registry, VerifierResult};
use std::path::Path;

/// Build a `Prover` over a fresh `StubTpm`, running the same init
/// lifecycle as `attest-prover`'s `main.rs` (take ownership, create AK,
/// persist it) against a scratch directory.
pub fn init_prover(name: &str, ak_path: &Path, verifier_url: &str) -> Prover {
    let tpm: Box<dyn TpmAdapter> = Box::new(StubTpm::new().expect("stub tpm init"));
    let config = ProverConfig {
        name: name.to_string(),
        ak_file: ak_path.to_path_buf(),
        owner_password: "owner".to_string(),
        user_password: "user".to_string(),
        verifier_url: verifier_url.to_string(),
    };
    Prover::init(config, tpm).expect("prover init")
}

/// Run the EK-then-AK registration a prover's `register()` would
/// perform over HTTP, but directly against an in-process [`Registry`]
/// — the handshake's ordering and rejection semantics are exercised
/// without opening a socket.
pub fn register_directly(
    registry: &Registry,
    trust_store: &ManufacturerTrustStore,
    prover: &Prover,
    name: &str,
    host: &str,
    port: &str,
) -> VerifierResult<()> {
    let ek_wire = attest_tpm::EndorsementKeyWire::from_ek(prover.ek());
    attest_verifier_core::register_new_ek(
        registry,
        trust_store,
        name.to_string(),
        host.to_string(),
        port.to_string(),
        ek_wire,
    )?;

    let ek_wire = attest_tpm::EndorsementKeyWire::from_ek(prover.ek());
    attest_verifier_core::register_new_ak(registry, ek_wire, prover.ak().clone())
}
