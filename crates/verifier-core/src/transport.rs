//! The verifier's outbound HTTP capability: POSTing a challenge to a
//! prover's `/attest` endpoint and getting back a Quote.
//!
//! A trait rather than a concrete `reqwest::Client` field: the original
//! `internal/verifier/verifier.go` held the HTTP client as a
//! process-wide package variable reassignable by tests, which this
//! rewrite replaces with an explicit transport handle passed through
//! the `Scheduler` constructor, substitutable with an in-memory fake in
//! tests (see `tests/integration`).

use crate::error::{VerifierError, VerifierResult};
use attest_quote::Quote;
use attest_transport::AttestRequest;
use async_trait::async_trait;

/// Capability to challenge a prover's `/attest` endpoint.
#[async_trait]
pub trait AttestationTransport: Send + Sync {
    /// `AttestationRequest`: POST `{Nonce: nonce}` to `url`, returning
    /// the decoded Quote. Rejects an empty nonce before sending.
    async fn attest(&self, url: &str, nonce: &[u8]) -> VerifierResult<Quote>;
}

/// The real transport: a shared `reqwest::Client` POSTing JSON.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an existing client (so the binary can configure timeouts
    /// once and share the client across the registration and
    /// attestation paths).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttestationTransport for ReqwestTransport {
    async fn attest(&self, url: &str, nonce: &[u8]) -> VerifierResult<Quote> {
        if nonce.is_empty() {
            return Err(VerifierError::EmptyNonce);
        }

        let request = AttestRequest {
            nonce: nonce.to_vec(),
        };
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(VerifierError::Transport(
                response.status().to_string(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VerifierError::Transport(e.to_string()))?;
        let quote = Quote::from_json(&bytes)
            .map_err(|e| VerifierError::MalformedResponse(e.to_string()))?;
        Ok(quote)
    }
}

/// In-memory fakes for exercising registry/scheduler logic without a
/// real network. Gated behind the `test-util` feature so the
/// integration test crate can depend on it without pulling fake
/// transports into a production build.
#[cfg(any(test, feature = "test-util"))]
pub mod fakes {
    use super::*;
    use std::sync::Mutex;

    /// An in-memory transport for tests: returns a fixed Quote (or
    /// error) without touching the network, and records every URL it
    /// was asked to attest, so scheduler-liveness tests can assert on
    /// call counts.
    pub struct FakeTransport {
        result: Box<dyn Fn(&str, &[u8]) -> VerifierResult<Quote> + Send + Sync>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        pub fn new<F>(result: F) -> Self
        where
            F: Fn(&str, &[u8]) -> VerifierResult<Quote> + Send + Sync + 'static,
        {
            Self {
                result: Box::new(result),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AttestationTransport for FakeTransport {
        async fn attest(&self, url: &str, nonce: &[u8]) -> VerifierResult<Quote> {
            if nonce.is_empty() {
                return Err(VerifierError::EmptyNonce);
            }
            self.calls.lock().unwrap().push(url.to_string());
            (self.result)(url, nonce)
        }
    }
}
