//! Prover lifecycle: TPM initialization, AK persistence, registration,
//! and attestation.

use crate::config::ProverConfig;
use crate::error::{ProverError, ProverResult};
use attest_quote::ALL_PCRS;
use attest_quote::Quote;
use attest_tpm::{AttestationKey, EndorsementKey, EndorsementKeyWire, TpmAdapter};
use attest_transport::{RegisterAkRequest, RegisterEkRequest};
use std::fs;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// A running prover: its TPM handle and the keys loaded from it.
pub struct Prover {
    config: ProverConfig,
    tpm: Box<dyn TpmAdapter>,
    ak: AttestationKey,
    ek: EndorsementKey,
}

impl Prover {
    /// Run the startup lifecycle against an already-open TPM handle:
    /// take ownership and create an AK on first run, otherwise reattach
    /// policies and reload the persisted AK.
    pub fn init(config: ProverConfig, mut tpm: Box<dyn TpmAdapter>) -> ProverResult<Self> {
        if !tpm.is_owned()? {
            tracing::info!("tpm unowned, taking ownership and creating a fresh AK");
            tpm.take_ownership(&config.owner_password, &config.user_password)?;
            let ak = tpm.create_ak()?;
            persist_ak(&config.ak_file, &ak)?;
        }

        tpm.prove_ownership(&config.owner_password)?;
        tpm.prove_usership(&config.user_password)?;

        let ek = tpm.get_ek()?;
        let ak = load_ak(&config.ak_file)?;

        Ok(Self {
            config,
            tpm,
            ak,
            ek,
        })
    }

    /// This prover's loaded AK.
    pub fn ak(&self) -> &AttestationKey {
        &self.ak
    }

    /// This prover's loaded EK.
    pub fn ek(&self) -> &EndorsementKey {
        &self.ek
    }

    /// Register with the verifier: EK first, then AK, in that mandatory
    /// order. `host` is the address the verifier should reach this
    /// prover's own `/attest` endpoint at — always the caller-supplied
    /// value, never a hardcoded address.
    pub async fn register(
        &self,
        client: &reqwest::Client,
        host: &str,
        port: &str,
    ) -> ProverResult<()> {
        let ek_wire = EndorsementKeyWire::from_ek(&self.ek);
        let ek_request = RegisterEkRequest {
            name: self.config.name.clone(),
            endpoint: host.to_string(),
            port: port.to_string(),
            ek: ek_wire,
        };
        post_success(
            client,
            &format!("{}/registerNewEK", self.config.verifier_url),
            &ek_request,
        )
        .await?;

        let ak_request = RegisterAkRequest {
            ek: EndorsementKeyWire::from_ek(&self.ek),
            ak: self.ak.clone(),
        };
        post_success(
            client,
            &format!("{}/registerNewAK", self.config.verifier_url),
            &ak_request,
        )
        .await?;

        tracing::info!(name = %self.config.name, "registered EK and AK with verifier");
        Ok(())
    }

    /// Produce a Quote over every PCR, bound to `nonce`. No local
    /// validation — checking the result is the verifier's job.
    pub fn attest(&self, nonce: &[u8]) -> ProverResult<Quote> {
        Ok(self.tpm.quote(&self.ak, nonce, &ALL_PCRS)?)
    }
}

async fn post_success<T: serde::Serialize>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
) -> ProverResult<()> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ProverError::RegistrationFailed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ProverError::RegistrationFailed(format!(
            "{url} returned {}",
            response.status()
        )));
    }
    Ok(())
}

fn persist_ak(path: &Path, ak: &AttestationKey) -> ProverResult<()> {
    let json = serde_json::to_vec_pretty(ak)?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &json)?;

    #[cfg(unix)]
    fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o400))?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn load_ak(path: &Path) -> ProverResult<AttestationKey> {
    let bytes = fs::read(path).map_err(|e| {
        ProverError::AkFileInconsistent(format!("reading {}: {e}", path.display()))
    })?;
    let ak: AttestationKey = serde_json::from_slice(&bytes)?;
    ak.validate_non_empty()?;
    Ok(ak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_tpm::StubTpm;

    #[test]
    fn init_creates_and_reloads_ak_file() {
        let dir = tempfile::tempdir().unwrap();
        let ak_path = dir.path().join("ak.json");
        let config = ProverConfig {
            name: "prover-1".to_string(),
            ak_file: ak_path.clone(),
            owner_password: "owner".to_string(),
            user_password: "user".to_string(),
            verifier_url: "http://verifier.example:8080".to_string(),
        };

        let tpm: Box<dyn TpmAdapter> = Box::new(StubTpm::new().unwrap());
        let prover = Prover::init(config.clone(), tpm).unwrap();
        assert!(ak_path.exists());

        let reloaded_tpm: Box<dyn TpmAdapter> = Box::new(StubTpm::new().unwrap());
        // A second init against a fresh (already-owned-by-construction in
        // this stub) TPM would normally reuse the same on-disk AK; here
        // we only check that loading the persisted file round-trips.
        let _ = reloaded_tpm;
        let loaded = load_ak(&ak_path).unwrap();
        assert_eq!(loaded.public_key, prover.ak().public_key);
    }

    #[test]
    fn attest_produces_verifiable_quote() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProverConfig {
            name: "prover-1".to_string(),
            ak_file: dir.path().join("ak.json"),
            owner_password: "owner".to_string(),
            user_password: "user".to_string(),
            verifier_url: "http://verifier.example:8080".to_string(),
        };
        let tpm: Box<dyn TpmAdapter> = Box::new(StubTpm::new().unwrap());
        let prover = Prover::init(config, tpm).unwrap();

        let nonce = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let quote = prover.attest(&nonce).unwrap();
        assert!(quote.verify(&prover.ak().public_key, &nonce).is_ok());
    }
}
