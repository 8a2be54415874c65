//! The attestation scheduler: one periodic loop per verifier, driving
//! attestation against every AK-registered prover and cancellable by a
//! shutdown signal observed between iterations.

use crate::challenge;
use crate::pcr_db::PcrSource;
use crate::registry::Registry;
use crate::transport::AttestationTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Outcome of attesting a single prover in one scheduler iteration.
#[derive(Debug)]
pub enum AttestOutcome {
    /// The Quote verified and its PCR state matched the reference DB.
    Verified,
    /// The Quote or PCR check failed; the prover is not penalized
    /// beyond this round's log line — the scheduler moves on.
    Failed(String),
}

/// Drives periodic attestation against the provers in a [`Registry`].
pub struct Scheduler {
    registry: Arc<Registry>,
    transport: Arc<dyn AttestationTransport>,
    pcr_source: Arc<dyn PcrSource>,
    interval: Duration,
}

impl Scheduler {
    /// Build a scheduler over `registry`, challenging provers through
    /// `transport` and checking PCR state against `pcr_source`.
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<dyn AttestationTransport>,
        pcr_source: Arc<dyn PcrSource>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            pcr_source,
            interval,
        }
    }

    /// One full pass over every AK-registered prover. Returns the
    /// number of provers attested (counting both successes and
    /// failures) — the scheduler-liveness property checks this count.
    pub async fn run_once(&self) -> usize {
        let provers = self.registry.snapshot_attestable();
        let mut attested = 0usize;

        // Processed sequentially: two iterations of the outer loop
        // never overlap, and within an iteration provers are attested
        // one at a time.
        for prover in provers {
            let outcome = self.attest_one(&prover).await;
            match &outcome {
                AttestOutcome::Verified => {
                    tracing::info!(prover = %prover.name, "attestation verified");
                }
                AttestOutcome::Failed(reason) => {
                    tracing::warn!(prover = %prover.name, reason = %reason, "attestation failed");
                }
            }
            attested += 1;
        }
        attested
    }

    async fn attest_one(&self, prover: &crate::registry::ProverRecord) -> AttestOutcome {
        let ak = match prover.ak() {
            Some(ak) => ak,
            None => return AttestOutcome::Failed("no AK registered".to_string()),
        };

        let nonce = challenge::generate();
        let url = format!("{}/attest", prover.base_url());
        let quote = match self.transport.attest(&url, &nonce).await {
            Ok(quote) => quote,
            Err(e) => return AttestOutcome::Failed(e.to_string()),
        };

        if let Err(e) = quote.verify(&ak.public_key, &nonce) {
            return AttestOutcome::Failed(e.to_string());
        }

        let expected = match self.pcr_source.load() {
            Ok(pcrs) => pcrs,
            Err(e) => return AttestOutcome::Failed(e.to_string()),
        };

        match quote.verify_pcrs(&expected) {
            Ok(()) => AttestOutcome::Verified,
            Err(e) => AttestOutcome::Failed(e.to_string()),
        }
    }

    /// Run the periodic loop until `shutdown` is signalled. A pending
    /// iteration always completes before the loop observes shutdown —
    /// cancellation is only checked between `run_once` and the
    /// following sleep.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("attestation scheduler shutting down");
                        return;
                    }
                }
            }

            if *shutdown.borrow() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcr_db::PcrSource;
    use crate::transport::fakes::FakeTransport;
    use attest_pki::EkCertificate;
    use attest_quote::{ALL_PCRS, ParsedQuote, PcrComposite, Pcr, PublicKey, Quote};
    use attest_tpm::{AttestationKey, EndorsementKey};
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding};
    use rsa::{BigUint, RsaPrivateKey};
    use sha1::{Digest, Sha1};
    use std::sync::Arc;
    use tokio::sync::watch;

    struct ZeroPcrs;
    impl PcrSource for ZeroPcrs {
        fn load(&self) -> crate::error::VerifierResult<Vec<Pcr>> {
            Ok(ALL_PCRS.iter().map(|&id| Pcr::new(id, vec![0u8; 20])).collect())
        }
    }

    fn signed_quote(private: &RsaPrivateKey, nonce: &[u8]) -> Quote {
        let composite = PcrComposite::build(
            &ALL_PCRS.iter().map(|&id| Pcr::new(id, vec![0u8; 20])).collect::<Vec<_>>(),
        )
        .unwrap();
        let digest = composite.digest();
        let nonce_hash: [u8; 20] = Sha1::digest(nonce).into();
        let parsed = ParsedQuote::new(digest, nonce_hash);
        let raw = parsed.to_bytes().unwrap();
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::<Sha1>::new(private.clone());
        let signature = signing_key.sign_with_rng(&mut rng, &raw);
        Quote::new(raw, signature.to_vec()).unwrap()
    }

    fn registry_with_one_prover() -> (Arc<Registry>, RsaPrivateKey) {
        let registry = Arc::new(Registry::new());
        let mut rng = rand::thread_rng();
        let ek_private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let ak_private = RsaPrivateKey::new(&mut rng, 2048).unwrap();

        let ek_pub = PublicKey::new(ek_private.to_public_key().n().clone(), 65537);
        let ak_pub = PublicKey::new(ak_private.to_public_key().n().clone(), 65537);

        let ek = EndorsementKey::new(EkCertificate::synthetic(ek_pub.clone()));
        registry
            .put_ek("prover-1".into(), "127.0.0.1".into(), "9000".into(), ek)
            .unwrap();
        registry
            .put_ak(&ek_pub, AttestationKey::new(ak_pub, vec![1, 2, 3]))
            .unwrap();

        (registry, ak_private)
    }

    #[tokio::test]
    async fn run_once_verifies_a_valid_quote() {
        let (registry, ak_private) = registry_with_one_prover();
        let ak_private_for_fake = ak_private.clone();
        let transport = Arc::new(FakeTransport::new(move |_url, nonce| {
            Ok(signed_quote(&ak_private_for_fake, nonce))
        }));
        let scheduler = Scheduler::new(
            registry,
            transport,
            Arc::new(ZeroPcrs),
            Duration::from_secs(60),
        );

        let attested = scheduler.run_once().await;
        assert_eq!(attested, 1);
    }

    #[tokio::test]
    async fn scheduler_liveness_invokes_verify_n_times_then_stops_on_shutdown() {
        let (registry, ak_private) = registry_with_one_prover();
        let transport = Arc::new(FakeTransport::new(move |_url, nonce| {
            Ok(signed_quote(&ak_private, nonce))
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

        assert!(transport.call_count() >= 2, "expected multiple iterations before shutdown");
    }
}
