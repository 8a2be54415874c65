//! Prover-side lifecycle: TPM initialization, AK persistence,
//! registration with the verifier, and producing Quotes on demand.

pub mod config;
pub mod error;
pub mod state;

pub use config::ProverConfig;
pub use error::{ProverError, ProverResult};
pub use state::Prover;
