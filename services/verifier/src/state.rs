//! Shared verifier service state.

use attest_pki::ManufacturerTrustStore;
use attest_verifier_core::{Registry, VerifierConfig};
use std::sync::Arc;

/// State shared across every HTTP handler.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub trust_store: ManufacturerTrustStore,
    pub config: VerifierConfig,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, trust_store: ManufacturerTrustStore, config: VerifierConfig) -> Self {
        Self {
            registry,
            trust_store,
            config,
        }
    }
}
