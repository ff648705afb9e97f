//! Keybridge Server - biometric login for the storefront
//!
//! Endpoints:
//! - POST /webauthn/register/options   - start credential registration
//! - POST /webauthn/register/verify    - verify + store credential
//! - GET  /webauthn/authenticate/options - start authentication
//! - POST /webauthn/authenticate/verify  - verify + issue login redirect

use std::time::Duration;

use keybridge_server::{create_router, AppState, Config};
use tracing_subscriber::EnvFilter;

/// How often the challenge ledger is swept for expired records.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let addr = config.socket_addr();

    let state = match AppState::from_config(config).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize application state");
            std::process::exit(1);
        }
    };

    // The sweeper belongs to the server lifecycle: spawned here, aborted on
    // shutdown, never left as untracked global state.
    let sweeper = {
        let engine = state.engine.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tick.tick().await;
                let purged = engine.sweep_expired_challenges();
                if purged > 0 {
                    tracing::debug!(purged, "expired challenges swept");
                }
            }
        })
    };

    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "keybridge server listening");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server error");
    }

    sweeper.abort();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install shutdown signal handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
