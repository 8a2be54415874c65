//! Software TPM stub: performs genuine RSA-PKCS1v15(SHA-1) signing so
//! that Quote verification exercises real cryptography without a
//! physical device.
//!
//! Unlike a fixture that returns canned bytes, every Quote produced
//! here actually verifies against the returned AK public key.

use crate::adapter::TpmAdapter;
use crate::error::{TpmError, TpmResult};
use crate::keys::{AttestationKey, EndorsementKey};
use attest_quote::{Pcr, PcrComposite, ParsedQuote, PublicKey, Quote, ALL_PCRS};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use std::collections::HashMap;

/// A software TPM, useful for tests and for deployments that explicitly
/// opt out of hardware (see `hardware_available` on the original
/// implementation's `TpmManager` for the idiom this follows).
pub struct StubTpm {
    owned: bool,
    ek_private: RsaPrivateKey,
    ak_private: Option<RsaPrivateKey>,
    pcrs: HashMap<u8, [u8; 20]>,
}

impl StubTpm {
    /// Build a fresh stub TPM with a freshly generated EK keypair and
    /// all PCRs at their zero state.
    pub fn new() -> TpmResult<Self> {
        let mut rng = OsRng;
        let ek_private = RsaPrivateKey::new(&mut rng, 2048)
            .map_err(|e| TpmError::KeyMaterialInvalid(e.to_string()))?;
        let pcrs = ALL_PCRS.iter().map(|&id| (id, [0u8; 20])).collect();
        Ok(Self {
            owned: false,
            ek_private,
            ak_private: None,
            pcrs,
        })
    }

    fn public_key_of(key: &RsaPrivateKey) -> TpmResult<PublicKey> {
        let public: RsaPublicKey = key.to_public_key();
        let e: u64 = public
            .e()
            .to_string()
            .parse()
            .map_err(|_| TpmError::KeyMaterialInvalid("exponent too wide".to_string()))?;
        Ok(PublicKey::new(public.n().clone(), e))
    }
}

impl TpmAdapter for StubTpm {
    fn is_owned(&self) -> TpmResult<bool> {
        Ok(self.owned)
    }

    fn take_ownership(&mut self, _owner_password: &str, _user_password: &str) -> TpmResult<()> {
        if self.owned {
            return Err(TpmError::AlreadyOwned);
        }
        self.owned = true;
        Ok(())
    }

    fn prove_ownership(&mut self, _owner_password: &str) -> TpmResult<()> {
        if !self.owned {
            return Err(TpmError::NotOwned);
        }
        Ok(())
    }

    fn prove_usership(&mut self, _user_password: &str) -> TpmResult<()> {
        if !self.owned {
            return Err(TpmError::NotOwned);
        }
        Ok(())
    }

    fn get_ek(&self) -> TpmResult<EndorsementKey> {
        let public_key = Self::public_key_of(&self.ek_private)?;
        Ok(EndorsementKey::new(attest_pki::EkCertificate::synthetic(
            public_key,
        )))
    }

    fn create_ak(&mut self) -> TpmResult<AttestationKey> {
        if !self.owned {
            return Err(TpmError::NotOwned);
        }
        let mut rng = OsRng;
        let private = RsaPrivateKey::new(&mut rng, 2048)
            .map_err(|e| TpmError::KeyMaterialInvalid(e.to_string()))?;
        let public_key = Self::public_key_of(&private)?;
        // The original forges a throwaway "PCA" key with an all-0xFF
        // 2048-bit modulus as the AK blob's signer context; we don't
        // need that forgery here since the blob is opaque to everyone
        // but this adapter, so the blob is just the serialized private
        // key material this adapter will reload on demand.
        let blob = private
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| TpmError::KeyMaterialInvalid(e.to_string()))?;
        self.ak_private = Some(private);
        Ok(AttestationKey::new(public_key, blob))
    }

    fn quote(&self, ak: &AttestationKey, nonce: &[u8], pcr_ids: &[u8]) -> TpmResult<Quote> {
        let private = self.ak_private.as_ref().ok_or_else(|| {
            TpmError::KeyMaterialInvalid("no AK loaded in this session".to_string())
        })?;

        let mut ids: Vec<u8> = pcr_ids.to_vec();
        ids.sort_unstable();
        let pcrs: Vec<Pcr> = ids
            .iter()
            .map(|id| {
                let value = self.pcrs.get(id).copied().unwrap_or([0u8; 20]);
                Pcr::new(*id, value.to_vec())
            })
            .collect();
        let composite = PcrComposite::build(&pcrs)?;
        let digest = composite.digest();
        let nonce_hash: [u8; 20] = Sha1::digest(nonce).into();

        let parsed = ParsedQuote::new(digest, nonce_hash);
        let raw = parsed.to_bytes()?;

        let mut rng = OsRng;
        let signing_key = SigningKey::<Sha1>::new(private.clone());
        let signature = signing_key.sign_with_rng(&mut rng, &raw);

        let _ = ak; // AK identity is implicit: this adapter only ever has one loaded.
        Ok(Quote::new(raw, signature.to_vec())?)
    }

    fn list_pcrs(&self) -> TpmResult<Vec<Pcr>> {
        let mut ids: Vec<&u8> = self.pcrs.keys().collect();
        ids.sort();
        Ok(ids
            .into_iter()
            .map(|&id| Pcr::new(id, self.pcrs[&id].to_vec()))
            .collect())
    }

    fn extend_pcr(&mut self, pcr_id: u8, data: &[u8], _event_id: u32, _event: &str) -> TpmResult<()> {
        let current = self.pcrs.get(&pcr_id).copied().ok_or_else(|| {
            TpmError::KeyMaterialInvalid(format!("unknown pcr id {pcr_id}"))
        })?;
        let mut hasher = Sha1::new();
        hasher.update(current);
        hasher.update(data);
        let extended: [u8; 20] = hasher.finalize().into();
        self.pcrs.insert(pcr_id, extended);
        Ok(())
    }
}

impl Default for StubTpm {
    fn default() -> Self {
        Self::new().expect("RSA key generation should not fail")
    }
}
