//! TPM adapter: the capability trait plus its hardware and software
//! implementations.

pub mod adapter;
pub mod error;
pub mod keys;
pub mod stub;

#[cfg(feature = "hardware-tpm")]
pub mod hardware;

pub use adapter::TpmAdapter;
pub use error::{TpmError, TpmResult};
pub use keys::{AttestationKey, EndorsementKey, EndorsementKeyWire};
pub use stub::StubTpm;

#[cfg(feature = "hardware-tpm")]
pub use hardware::HardwareTpm;
