//! The verifier's three inbound endpoints. Thin by design: deserialize,
//! call into `attest-verifier-core`, serialize the result or map the
//! error to a status code. No protocol logic lives here.

use crate::state::AppState;
use attest_transport::{InitializationParams, RegisterAkRequest, RegisterEkRequest};
use attest_verifier_core::VerifierError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

/// `GET /getNewEdgeInitParameters`.
pub async fn get_new_edge_init_parameters(
    State(state): State<Arc<AppState>>,
) -> Json<InitializationParams> {
    Json(InitializationParams {
        owner_password: state.config.owner_password.clone(),
        user_password: state.config.user_password.clone(),
    })
}

/// `POST /registerNewEK`: 400 on missing fields, 500 on internal
/// failure (including a legitimate duplicate-registration rejection —
/// the verifier's own idempotent-restart path is the only caller that
/// suppresses that particular error).
pub async fn register_new_ek(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterEkRequest>,
) -> Result<Json<&'static str>, StatusCode> {
    if request.name.is_empty() || request.endpoint.is_empty() || request.port.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    attest_verifier_core::register_new_ek(
        &state.registry,
        &state.trust_store,
        request.name,
        request.endpoint,
        request.port,
        request.ek,
    )
    .map_err(map_registration_error)?;

    Ok(Json("success"))
}

/// `POST /registerNewAK`: 400 on missing fields, 500 on internal
/// failure.
pub async fn register_new_ak(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterAkRequest>,
) -> Result<Json<&'static str>, StatusCode> {
    if request.ak.blob.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    attest_verifier_core::register_new_ak(&state.registry, request.ek, request.ak)
        .map_err(map_registration_error)?;

    Ok(Json("success"))
}

fn map_registration_error(err: VerifierError) -> StatusCode {
    tracing::error!(error = %err, "registration rejected");
    match err {
        VerifierError::MalformedResponse(_) | VerifierError::MissingEk | VerifierError::MissingAk => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
