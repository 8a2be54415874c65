//! `attest-prover`: opens the local TPM, initializes (or reloads) its
//! Attestation Identity Key, registers with the configured verifier,
//! and serves `/attest` until shut down.

mod config;
mod handlers;
mod state;

use attest_prover_core::Prover;
use attest_tpm::TpmAdapter;
use axum::routing::post;
use axum::Router;
use clap::Parser;
use config::{Cli, ResolvedConfig};
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const READ_WRITE_TIMEOUT: Duration = Duration::from_secs(15);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        attest_core::logging::init_json();
    } else {
        attest_core::logging::init();
    }

    let resolved = ResolvedConfig::resolve(cli)?;

    let tpm = open_tpm()?;
    let prover = Prover::init(resolved.prover, tpm)?;

    let client = reqwest::Client::new();
    prover
        .register(&client, &resolved.address, &resolved.port)
        .await?;
    tracing::info!("registered with verifier");

    let state = Arc::new(AppState::new(prover));
    let app = Router::new()
        .route("/attest", post(handlers::attest))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(READ_WRITE_TIMEOUT));

    let bind_addr = format!("{}:{}", resolved.address, resolved.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "attest-prover listening");

    let drain = std::sync::Arc::new(tokio::sync::Notify::new());
    let drain_for_server = drain.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain_for_server.notified().await })
            .await
    });

    shutdown_signal().await;
    drain.notify_one();

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => return Err(e.into()),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => tracing::warn!("in-flight requests did not drain within the shutdown grace period"),
    }

    Ok(())
}

#[cfg(not(feature = "hardware-tpm"))]
fn open_tpm() -> anyhow::Result<Box<dyn TpmAdapter>> {
    Ok(Box::new(attest_tpm::StubTpm::new()?))
}

#[cfg(feature = "hardware-tpm")]
fn open_tpm() -> anyhow::Result<Box<dyn TpmAdapter>> {
    Ok(Box::new(attest_tpm::HardwareTpm::open()?))
}

/// Waits for an interrupt/terminate signal, then returns so
/// `axum::serve`'s graceful shutdown can start its grace period.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!(grace = ?SHUTDOWN_GRACE, "shutdown signal received");
}
