//! Prover registry: the two EK/AK-keyed mappings every registered
//! prover lives in.
//!
//! Mirrors `ReplayProtector`'s `Arc<RwLock<HashMap<...>>>` shape (see
//! `attest-tpm`'s sibling crates) rather than reaching for an async
//! lock — registry reads and writes are short, non-blocking map
//! operations, so a synchronous `RwLock` held only across the
//! operation body is the right tool; nothing here ever awaits while
//! holding it.

use crate::error::{VerifierError, VerifierResult};
use attest_quote::PublicKey;
use attest_tpm::{AttestationKey, EndorsementKey};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A registered prover: its network location and the keys it has
/// presented so far. The same record is shared between `ProversEK` and
/// `ProversAK` — a single owned record with two index entries, not two
/// owners of independent copies.
pub struct ProverRecord {
    /// Logical name announced at EK registration.
    pub name: String,
    /// Host the verifier should reach this prover's `/attest` endpoint at.
    pub endpoint: String,
    /// Port the prover's `/attest` endpoint listens on.
    pub port: String,
    /// This prover's Endorsement Key.
    pub ek: EndorsementKey,
    /// This prover's Attestation Identity Key, once registered.
    ak: RwLock<Option<AttestationKey>>,
}

impl ProverRecord {
    /// Build a record from an EK registration; no AK yet.
    pub fn new(name: String, endpoint: String, port: String, ek: EndorsementKey) -> Self {
        Self {
            name,
            endpoint,
            port,
            ek,
            ak: RwLock::new(None),
        }
    }

    /// This record's AK, if one has been registered.
    pub fn ak(&self) -> Option<AttestationKey> {
        self.ak.read().expect("ak lock poisoned").clone()
    }

    /// The full `http://host:port` base this prover's endpoints live at.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.endpoint, self.port)
    }
}

/// The verifier's in-memory prover registry: `ProversEK` keyed by the
/// EK's canonical `"{N}:{E}"` form, `ProversAK` keyed by the AK's.
#[derive(Default)]
pub struct Registry {
    provers_ek: RwLock<HashMap<String, Arc<ProverRecord>>>,
    provers_ak: RwLock<HashMap<String, Arc<ProverRecord>>>,
}

impl Registry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// `RegisterNewEK`: rejects duplicate EK keys, otherwise inserts.
    pub fn put_ek(
        &self,
        name: String,
        endpoint: String,
        port: String,
        ek: EndorsementKey,
    ) -> VerifierResult<()> {
        let key = ek.public_key().canonical_key();
        let mut ek_map = self.provers_ek.write().expect("registry lock poisoned");
        if ek_map.contains_key(&key) {
            return Err(VerifierError::DuplicateRegistration(key));
        }
        ek_map.insert(key, Arc::new(ProverRecord::new(name, endpoint, port, ek)));
        Ok(())
    }

    /// Like [`Self::put_ek`], but treats `DuplicateRegistration` as
    /// success instead of an error — the elision the verifier's own
    /// restart-tolerant registration path applies, since a prover
    /// retrying its startup registration against an already-running
    /// verifier should see the same success response either way.
    pub fn put_ek_idempotent(
        &self,
        name: String,
        endpoint: String,
        port: String,
        ek: EndorsementKey,
    ) -> VerifierResult<()> {
        match self.put_ek(name, endpoint, port, ek) {
            Err(VerifierError::DuplicateRegistration(key)) => {
                tracing::debug!(%key, "duplicate EK registration elided");
                Ok(())
            }
            other => other,
        }
    }

    /// `RegisterNewAK`: requires a prior EK registration for the
    /// referenced key; rejects duplicate AK keys.
    pub fn put_ak(&self, ek_key: &PublicKey, ak: AttestationKey) -> VerifierResult<()> {
        let record = {
            let ek_map = self.provers_ek.read().expect("registry lock poisoned");
            ek_map
                .get(&ek_key.canonical_key())
                .cloned()
                .ok_or(VerifierError::ProverNotFound)?
        };

        let ak_key = ak.public_key.canonical_key();
        let mut ak_map = self.provers_ak.write().expect("registry lock poisoned");
        if ak_map.contains_key(&ak_key) {
            return Err(VerifierError::DuplicateRegistration(ak_key));
        }

        *record.ak.write().expect("registry lock poisoned") = Some(ak);
        ak_map.insert(ak_key, record);
        Ok(())
    }

    /// Same elision as [`Self::put_ek_idempotent`], for AK registration.
    pub fn put_ak_idempotent(&self, ek_key: &PublicKey, ak: AttestationKey) -> VerifierResult<()> {
        match self.put_ak(ek_key, ak) {
            Err(VerifierError::DuplicateRegistration(key)) => {
                tracing::debug!(%key, "duplicate AK registration elided");
                Ok(())
            }
            other => other,
        }
    }

    /// Snapshot of every prover that has completed AK registration, for
    /// the scheduler to iterate without holding the registry lock for
    /// the duration of a full attestation round.
    pub fn snapshot_attestable(&self) -> Vec<Arc<ProverRecord>> {
        self.provers_ak
            .read()
            .expect("registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Number of provers with a registered EK. Exposed for tests.
    pub fn ek_count(&self) -> usize {
        self.provers_ek.read().expect("registry lock poisoned").len()
    }

    /// Number of provers with a registered AK. Exposed for tests.
    pub fn ak_count(&self) -> usize {
        self.provers_ak.read().expect("registry lock poisoned").len()
    }
}
