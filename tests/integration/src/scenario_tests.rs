//! Literal end-to-end attestation scenarios (S1-S6), driven through the
//! full prover/registry stack rather than constructed by hand against
//! the codec directly (see `attest-quote`'s own test suite for that
//! level).

use crate::test_utils::{init_prover, register_directly};
use attest_pki::ManufacturerTrustStore;
use attest_quote::QuoteError;
use attest_verifier_core::{Registry, VerifierError};
use sha1::{Digest, Sha1};

const S1_NONCE: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

#[test]
fn s1_quote_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("s1", &dir.path().join("ak.json"), "http://verifier:8080");

    let nonce_hash = Sha1::digest(S1_NONCE);
    assert_eq!(
        hex::encode(nonce_hash),
        "7037807198c22a7d2b0807371d763779a84fdfcf"
    );

    let quote = prover.attest(&S1_NONCE).unwrap();
    assert!(quote.verify(&prover.ak().public_key, &S1_NONCE).is_ok());
}

#[test]
fn s2_nonce_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("s2", &dir.path().join("ak.json"), "http://verifier:8080");

    let quote = prover.attest(&S1_NONCE).unwrap();
    let wrong_nonce = [0x00u8; 8];
    assert_eq!(
        quote.verify(&prover.ak().public_key, &wrong_nonce),
        Err(QuoteError::NonceMismatch)
    );
}

#[test]
fn s3_fixed_magic_mismatch() {
    use attest_quote::{ParsedQuote, PublicKey, Quote};
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding};
    use rsa::RsaPrivateKey;

    // A genuine TPM never emits anything but "QUOT" in this field, so
    // reaching FixedMagicMismatch end-to-end means forging a Quote
    // whose raw block carries the wrong magic but is still validly
    // signed — exactly what a malicious or buggy prover would submit.
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
    let public = private.to_public_key();
    let ak = PublicKey::new(public.n().clone(), public.e().to_string().parse().unwrap());

    let nonce_hash: [u8; 20] = Sha1::digest(S1_NONCE).into();
    let parsed = ParsedQuote::new([0u8; 20], nonce_hash);
    let mut raw = parsed.to_bytes().unwrap();
    raw[4..8].copy_from_slice(b"XXXX");

    let signing_key = SigningKey::<Sha1>::new(private);
    let signature = signing_key.sign_with_rng(&mut rng, &raw);

    let quote = Quote::new(raw, signature.to_vec()).unwrap();
    assert_eq!(
        quote.verify(&ak, &S1_NONCE),
        Err(QuoteError::FixedMagicMismatch)
    );
}

#[test]
fn s4_pcr_composite_for_0_7_23() {
    use attest_quote::{Pcr, PcrComposite};

    let pcrs = vec![
        Pcr::new(0, vec![0xAAu8; 20]),
        Pcr::new(7, vec![0xBBu8; 20]),
        Pcr::new(23, vec![0xCCu8; 20]),
    ];
    let composite = PcrComposite::build(&pcrs).unwrap();
    assert_eq!(composite.bitmap(), [0x81, 0x00, 0x80]);
    assert_eq!(composite.values().len(), 60);
    assert_eq!(composite.to_bytes().len(), 69);
}

#[test]
fn s5_duplicate_ek_keyed_as_n_colon_e() {
    use attest_pki::EkCertificate;
    use attest_quote::PublicKey;
    use attest_tpm::EndorsementKey;
    use rsa::BigUint;

    let registry = Registry::new();
    let ek = EndorsementKey::new(EkCertificate::synthetic(PublicKey::new(
        BigUint::from(0xABu32),
        65537,
    )));
    registry
        .put_ek("p".to_string(), "h".to_string(), "1".to_string(), ek)
        .unwrap();

    let ek_again = EndorsementKey::new(EkCertificate::synthetic(PublicKey::new(
        BigUint::from(0xABu32),
        65537,
    )));
    let err = registry
        .put_ek("p".to_string(), "h".to_string(), "1".to_string(), ek_again)
        .unwrap_err();

    assert!(matches!(err, VerifierError::DuplicateRegistration(k) if k == "171:65537"));
    assert_eq!(registry.ek_count(), 1);
}

#[test]
fn s6_ak_before_ek() {
    let dir = tempfile::tempdir().unwrap();
    let prover = init_prover("s6", &dir.path().join("ak.json"), "http://verifier:8080");
    let registry = Registry::new();
    let trust_store = ManufacturerTrustStore::default();

    // registerAK without a prior registerEK for this prover.
    let ek_wire = attest_tpm::EndorsementKeyWire::from_ek(prover.ek());
    let err = attest_verifier_core::register_new_ak(&registry, ek_wire, prover.ak().clone())
        .unwrap_err();
    assert!(matches!(err, VerifierError::ProverNotFound));

    // Registering in the correct order succeeds.
    register_directly(&registry, &trust_store, &prover, "s6", "127.0.0.1", "9000").unwrap();
    assert_eq!(registry.ak_count(), 1);
}
