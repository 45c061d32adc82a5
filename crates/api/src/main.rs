//! `kiuas-api` -- sauna monitor service.
//!
//! Receives RuuviTag payloads on `POST /api/receive-bt`, tracks the sauna's
//! thermal state and posts warming / ready / stalled notifications to
//! Telegram. A watchdog alerts the maintenance chat when the sensor goes
//! quiet. See [`kiuas_api::config::ServiceConfig::from_env`] for the
//! environment variables.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kiuas_core::monitor::Monitor;
use kiuas_events::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kiuas_api::config::ServiceConfig;
use kiuas_api::engine::{Destinations, SaunaEngine};
use kiuas_api::state::AppState;
use kiuas_api::{background, router};

/// How long each background task gets to finish after cancellation.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiuas_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %config.host,
        port = config.port,
        ready_threshold = config.monitor.ready_threshold,
        warming_rate_lower_bound = config.monitor.warming_rate_lower_bound,
        reset_threshold = config.monitor.reset_threshold,
        "Loaded service configuration"
    );

    // --- Telegram ---
    let telegram =
        TelegramClient::with_base_url(&config.telegram.api_url, &config.telegram.bot_token)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build Telegram client");
                std::process::exit(1);
            });

    // --- Engine ---
    let engine = Arc::new(SaunaEngine::new(
        Monitor::new(config.monitor.clone(), Utc::now()),
        Arc::new(telegram.clone()),
        Destinations {
            notification: config.notification_chat_id,
            maintenance: config.maintenance_chat_id,
        },
        config.display_offset,
    ));

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let watchdog_handle = tokio::spawn(background::watchdog::run(
        Arc::clone(&engine),
        config.watchdog_interval,
        cancel.clone(),
    ));

    let commands_handle = config.telegram.commands_enabled.then(|| {
        tokio::spawn(background::commands::run(
            Arc::clone(&engine),
            telegram,
            cancel.clone(),
        ))
    });

    // --- Router ---
    let addr = SocketAddr::new(
        config.host.parse::<IpAddr>().unwrap_or_else(|e| {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }),
        config.port,
    );
    let state = AppState {
        config: Arc::new(config),
        engine,
    };
    let app = router::build_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    cancel.cancel();

    let _ = tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, watchdog_handle).await;
    if let Some(handle) = commands_handle {
        let _ = tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await;
    }

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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
