//! The TPM capability trait: the narrow set of operations the prover
//! core needs, dispatched to either a hardware-backed or software-stub
//! implementation.

use crate::error::TpmResult;
use crate::keys::{AttestationKey, EndorsementKey};
use attest_quote::{Pcr, Quote};

/// Capability set exposed by a TPM, real or simulated.
///
/// Every method models a blocking TPM command — the device is a serial
/// resource, so callers on an async runtime should dispatch through a
/// blocking-task boundary (`tokio::task::spawn_blocking`) rather than
/// call directly from an async context.
pub trait TpmAdapter: Send {
    /// Whether the TPM reports itself as owned.
    fn is_owned(&self) -> TpmResult<bool>;

    /// Take ownership: apply `SHA-1(ownerPwd)`/`SHA-1(userPwd)` as the
    /// TPM and SRK policy secrets, then perform the ownership
    /// transition. One-shot — fails with `AlreadyOwned` if already owned.
    fn take_ownership(&mut self, owner_password: &str, user_password: &str) -> TpmResult<()>;

    /// Reattach the owner policy to the TPM handle for this session.
    fn prove_ownership(&mut self, owner_password: &str) -> TpmResult<()>;

    /// Reattach the user policy to the SRK handle for this session.
    fn prove_usership(&mut self, user_password: &str) -> TpmResult<()>;

    /// Read the EK certificate from NVRAM and derive its RSA public key.
    fn get_ek(&self) -> TpmResult<EndorsementKey>;

    /// Create a 2048-bit AK inside the TPM, signed by a throwaway PCA key.
    fn create_ak(&mut self) -> TpmResult<AttestationKey>;

    /// Produce a Quote over the given PCR selection, bound to `nonce`.
    fn quote(&self, ak: &AttestationKey, nonce: &[u8], pcr_ids: &[u8]) -> TpmResult<Quote>;

    /// Snapshot of every PCR the TPM currently holds.
    fn list_pcrs(&self) -> TpmResult<Vec<Pcr>>;

    /// Extend a PCR with a measurement.
    fn extend_pcr(&mut self, pcr_id: u8, data: &[u8], event_id: u32, event: &str) -> TpmResult<()>;
}
