// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::net::TcpListener;
use tracing::{info, warn};

use trivia_coffee_server::{
    api::router,
    auth::TokenAuthenticator,
    config::AppConfig,
    logging,
    state::AppState,
    store::InMemoryStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    logging::init(config.log_format);

    let authenticator = TokenAuthenticator::new(config.auth.clone())?;
    info!(
        issuer = %config.auth.issuer(),
        audience = %config.auth.audience,
        jwks_url = %config.auth.jwks_url(),
        "bearer token verification configured"
    );

    // Warm the key cache; requests refetch on demand if this fails.
    if let Err(e) = authenticator.keys().refresh().await {
        warn!(error = %e, "initial JWKS fetch failed");
    }

    let store = if config.seed_sample_data {
        info!("seeding sample drinks and trivia questions");
        InMemoryStore::seeded()
    } else {
        InMemoryStore::new()
    };

    let app = router(AppState::new(store, authenticator));
    let addr = config.bind_addr;

    match &config.tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                warn!("rustls crypto provider already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

            let handle = Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(None);
            });

            info!(%addr, "listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(addr).await?;
            info!(%addr, "listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    info!("server stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, using Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C");
    }
}
