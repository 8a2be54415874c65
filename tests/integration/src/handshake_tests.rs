//! The three-phase handshake: EK registration -> AK registration ->
//! quote challenge/verify, plus its mandatory ordering.

use crate::test_utils::{init_prover, register_directly};
use attest_pki::ManufacturerTrustStore;
use attest_verifier_core::{Registry, VerifierError};

#[test]
fn full_handshake_then_attest_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("prover-1", &dir.path().join("ak.json"), "http://verifier:8080");

    let registry = Registry::new();
    let trust_store = ManufacturerTrustStore::default();
    register_directly(&registry, &trust_store, &prover, "prover-1", "127.0.0.1", "9001").unwrap();

    assert_eq!(registry.ek_count(), 1);
    assert_eq!(registry.ak_count(), 1);

    let nonce = [9u8, 8, 7, 6, 5, 4, 3, 2];
    let quote = prover.attest(&nonce).unwrap();
    assert!(quote.verify(&prover.ak().public_key, &nonce).is_ok());
}

#[test]
fn ak_registration_before_ek_is_rejected_with_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("prover-2", &dir.path().join("ak.json"), "http://verifier:8080");

    let registry = Registry::new();
    let ek_wire = attest_tpm::EndorsementKeyWire::from_ek(prover.ek());
    let err = attest_verifier_core::register_new_ak(&registry, ek_wire, prover.ak().clone())
        .unwrap_err();

    assert!(matches!(err, VerifierError::ProverNotFound));
    assert_eq!(registry.ek_count(), 0);
    assert_eq!(registry.ak_count(), 0);
}

#[test]
fn duplicate_ek_registration_is_rejected_and_leaves_registry_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("prover-3", &dir.path().join("ak.json"), "http://verifier:8080");

    let registry = Registry::new();
    let trust_store = ManufacturerTrustStore::default();
    register_directly(&registry, &trust_store, &prover, "prover-3", "127.0.0.1", "9003").unwrap();

    let ek_wire = attest_tpm::EndorsementKeyWire::from_ek(prover.ek());
    let err = attest_verifier_core::register_new_ek(
        &registry,
        &trust_store,
        "prover-3-again".to_string(),
        "127.0.0.1".to_string(),
        "9003".to_string(),
        ek_wire,
    )
    .unwrap_err();

    assert!(matches!(err, VerifierError::DuplicateRegistration(_)));
    assert_eq!(registry.ek_count(), 1);
}

#[test]
fn two_independent_provers_register_under_distinct_keys() {
    let dir = tempfile::tempdir().unwrap();
    let prover_a = init_prover("prover-a", &dir.path().join("a.json"), "http://verifier:8080");
    let prover_b = init_prover("prover-b", &dir.path().join("b.json"), "http://verifier:8080");

    let registry = Registry::new();
    let trust_store = ManufacturerTrustStore::default();
    register_directly(&registry, &trust_store, &prover_a, "prover-a", "127.0.0.1", "9001").unwrap();
    register_directly(&registry, &trust_store, &prover_b, "prover-b", "127.0.0.1", "9002").unwrap();

    assert_eq!(registry.ek_count(), 2);
    assert_eq!(registry.ak_count(), 2);
}
