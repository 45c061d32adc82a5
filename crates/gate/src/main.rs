//! `kiuas-gate` -- ForwardAuth replay-protection service.
//!
//! See [`kiuas_gate::config::GateConfig::from_env`] for the environment
//! variables.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use kiuas_gate::config::GateConfig;
use kiuas_gate::router::build_router;
use kiuas_gate::{nonce, ApiKey, Gate, NonceStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiuas_gate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GateConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let nonces = Arc::new(NonceStore::new());
    let gate = Arc::new(Gate::new(
        ApiKey::new(&config.api_key),
        config.timestamp_window,
        Arc::clone(&nonces),
    ));

    let cancel = CancellationToken::new();
    let cleanup_handle = tokio::spawn(nonce::run_cleanup(
        nonces,
        config.cleanup_interval,
        cancel.clone(),
    ));

    let host: IpAddr = config.host.parse().unwrap_or_else(|e| {
        tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
        std::process::exit(1);
    });
    let addr = SocketAddr::new(host, config.port);

    tracing::info!(
        %addr,
        window_secs = config.timestamp_window.num_seconds(),
        "Authentication gate started"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, build_router(gate))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
