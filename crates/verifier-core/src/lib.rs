//! Verifier core: the prover registry, challenge generation, the
//! attestation scheduler, and the outbound transport capability they
//! share.
//!
//! Registration itself (`RegisterNewEK`/`RegisterNewAK`) is exposed as
//! free functions taking a [`registry::Registry`] and an
//! [`attest_pki::ManufacturerTrustStore`] rather than methods on a
//! "Verifier" god object — the transport boundary (`services/verifier`)
//! owns the HTTP-handler glue and calls straight into these.

pub mod challenge;
pub mod config;
pub mod error;
pub mod pcr_db;
pub mod registry;
pub mod scheduler;
pub mod transport;

pub use challenge::generate as generate_challenge;
pub use config::VerifierConfig;
pub use error::{VerifierError, VerifierResult};
pub use pcr_db::{FileDb, PcrSource};
pub use registry::{ProverRecord, Registry};
pub use scheduler::Scheduler;
pub use transport::{AttestationTransport, ReqwestTransport};

use attest_pki::ManufacturerTrustStore;
use attest_tpm::{AttestationKey, EndorsementKeyWire};

/// `RegisterNewEK`: verify the EK certificate's manufacturer chain
/// (non-fatal ASN.1 issues are tolerated and logged, matching the
/// original's `x509.IsFatal` policy — see `attest_pki::ManufacturerTrustStore::verify`),
/// then insert into the registry.
pub fn register_new_ek(
    registry: &Registry,
    trust_store: &ManufacturerTrustStore,
    name: String,
    endpoint: String,
    port: String,
    ek_wire: EndorsementKeyWire,
) -> VerifierResult<()> {
    let ek = ek_wire
        .into_ek()
        .map_err(|e| VerifierError::MalformedResponse(e.to_string()))?;
    trust_store.verify(ek.certificate())?;
    registry.put_ek(name, endpoint, port, ek)
}

/// `RegisterNewAK`: look up the prover by its already-registered EK and
/// attach the AK, rejecting duplicates and AK-before-EK ordering.
pub fn register_new_ak(
    registry: &Registry,
    ek_wire: EndorsementKeyWire,
    ak: AttestationKey,
) -> VerifierResult<()> {
    let ek = ek_wire
        .into_ek()
        .map_err(|e| VerifierError::MalformedResponse(e.to_string()))?;
    registry.put_ak(ek.public_key(), ak)
}
