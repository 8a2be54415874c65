//! `attest-verifier`: serves prover registration, then drives a
//! periodic attestation scheduler against every AK-registered prover
//! until shut down.

mod config;
mod handlers;
mod state;

use attest_pki::ManufacturerTrustStore;
use attest_verifier_core::{FileDb, ReqwestTransport, Registry, Scheduler};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use config::Cli;
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

    let verifier_config = config::resolve(cli)?;

    let registry = Arc::new(Registry::new());
    // No manufacturer roots are configured by default; an empty trust
    // store accepts any EK certificate, logging a warning, per the
    // original's non-fatal ASN.1-tolerance policy.
    let trust_store = ManufacturerTrustStore::default();

    let client = reqwest::Client::new();
    let transport = Arc::new(ReqwestTransport::new(client));
    let pcr_source = Arc::new(FileDb::new(verifier_config.pcr_db_path.clone()));
    let scheduler = Arc::new(Scheduler::new(
        registry.clone(),
        transport,
        pcr_source,
        verifier_config.attestation_interval,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler_handle = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run(shutdown_rx).await }
    });

    let state = Arc::new(AppState::new(registry, trust_store, verifier_config.clone()));
    let app = Router::new()
        .route(
            "/getNewEdgeInitParameters",
            get(handlers::get_new_edge_init_parameters),
        )
        .route("/registerNewEK", post(handlers::register_new_ek))
        .route("/registerNewAK", post(handlers::register_new_ak))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(READ_WRITE_TIMEOUT));

    let bind_addr = format!("{}:{}", verifier_config.address, verifier_config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "attest-verifier listening");

    let drain = std::sync::Arc::new(tokio::sync::Notify::new());
    let drain_for_server = drain.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain_for_server.notified().await })
            .await
    });

    shutdown_signal().await;
    drain.notify_one();
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => return Err(e.into()),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => tracing::warn!("in-flight requests did not drain within the shutdown grace period"),
    }

    // The scheduler observes the quit signal between sleep and next
    // iteration; a pending iteration is allowed to complete.
    let _ = scheduler_handle.await;

    Ok(())
}

/// Waits for an interrupt/terminate signal.
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

    tracing::info!("shutdown signal received");
}
