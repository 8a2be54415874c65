//! The prover's one inbound endpoint: `POST /attest`.
//!
//! Thin by design — deserialize, delegate to `attest-prover-core`,
//! serialize or map the error to a status code. No protocol logic
//! lives here.

use crate::state::AppState;
use attest_transport::AttestRequest;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

/// `POST /attest`: 400 on an empty/invalid nonce, 500 on a Quote
/// failure, otherwise the serialized Quote.
pub async fn attest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AttestRequest>,
) -> Result<Json<attest_transport::AttestResponse>, StatusCode> {
    if request.nonce.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // TPM operations are treated as blocking (the device is serial);
    // run the Quote, and the mutex acquisition that serializes it
    // against concurrent attest calls, off the async runtime's worker
    // threads.
    let quote = tokio::task::spawn_blocking(move || {
        let prover = state.prover.lock().expect("prover lock poisoned");
        prover.attest(&request.nonce)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .map_err(|e| {
        tracing::error!(error = %e, "attest failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(quote))
}
