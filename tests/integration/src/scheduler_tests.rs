//! The scheduler-liveness property, driven against a genuine
//! `StubTpm`-backed prover rather than hand-built Quotes: each periodic
//! round must challenge the prover anew and verify a fresh signature.

use crate::test_utils::{init_prover, register_directly};
use attest_pki::ManufacturerTrustStore;
use attest_quote::{Pcr, ALL_PCRS};
use attest_verifier_core::transport::fakes::FakeTransport;
use attest_verifier_core::{PcrSource, Registry, Scheduler, VerifierError, VerifierResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

struct ZeroPcrs;
impl PcrSource for ZeroPcrs {
    fn load(&self) -> VerifierResult<Vec<Pcr>> {
        Ok(ALL_PCRS.iter().map(|&id| Pcr::new(id, vec![0u8; 20])).collect())
    }
}

#[tokio::test]
async fn run_once_attests_a_real_prover_through_the_stub_tpm() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("scheduled-1", &dir.path().join("ak.json"), "http://verifier:8080");

    let registry = Arc::new(Registry::new());
    let trust_store = ManufacturerTrustStore::default();
    register_directly(&registry, &trust_store, &prover, "scheduled-1", "127.0.0.1", "9100")
        .unwrap();

    let transport = Arc::new(FakeTransport::new(move |_url, nonce| {
        prover.attest(nonce).map_err(|e| VerifierError::Transport(e.to_string()))
    }));

    let scheduler = Scheduler::new(registry, transport, Arc::new(ZeroPcrs), Duration::from_secs(60));
    let attested = scheduler.run_once().await;
    assert_eq!(attested, 1);
}

#[tokio::test]
async fn scheduler_keeps_attesting_a_real_prover_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("scheduled-2", &dir.path().join("ak.json"), "http://verifier:8080");

    let registry = Arc::new(Registry::new());
    let trust_store = ManufacturerTrustStore::default();
    register_directly(&registry, &trust_store, &prover, "scheduled-2", "127.0.0.1", "9101")
        .unwrap();

    let transport = Arc::new(FakeTransport::new(move |_url, nonce| {
        prover.attest(nonce).map_err(|e| VerifierError::Transport(e.to_string()))
    }));
    let scheduler = Arc::new(Scheduler::new(
        registry,
        transport.clone(),
        Arc::new(ZeroPcrs),
        Duration::from_millis(20),
    ));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run(rx).await }
    });

    tokio::time::sleep(Duration::from_millis(90)).await;
    tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_millis(200), handle)
        .await
        .expect("scheduler did not shut down within one interval + grace")
        .unwrap();

    assert!(transport.call_count() >= 2, "expected multiple attestation rounds before shutdown");
}
