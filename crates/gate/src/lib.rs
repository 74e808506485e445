// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokengate: credential-refreshing reverse proxy.
//!
//! Obtains an access token via a client-credentials exchange, refreshes it on
//! a fixed interval, and forwards every inbound request to one upstream with
//! the token injected.

pub mod config;
pub mod credential;
pub mod error;
pub mod proxy;
pub mod secret;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::{Arc, Once};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::secret::{FileSecretProvider, GatewaySecrets};
use crate::state::Gateway;
use crate::transport::{build_health_router, build_router};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Load secrets and run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    ensure_crypto();

    let provider = FileSecretProvider::new(&config.secrets_dir);
    let secrets = GatewaySecrets::load(&provider)?;
    let strategy = config.strategy_kind()?.build(&config)?;

    let shutdown = CancellationToken::new();
    let gateway = Arc::new(Gateway::new(config, secrets, strategy, shutdown.clone())?);

    spawn_signal_handler(shutdown.clone());
    serve(gateway).await
}

/// Bind the listeners, start the refresh loop, and serve until shutdown.
pub async fn serve(gateway: Arc<Gateway>) -> anyhow::Result<()> {
    let config = &gateway.config;
    let shutdown = gateway.shutdown.clone();

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    if let Some(health_port) = config.health_port {
        let health_router = build_health_router(Arc::clone(&gateway));
        let health_addr = format!("{}:{}", config.host, health_port);
        let health_listener = TcpListener::bind(&health_addr).await?;
        info!("health probe listening on {health_addr}");
        let sd = shutdown.clone();
        tokio::spawn(async move {
            let result =
                axum::serve(health_listener, health_router).with_graceful_shutdown(sd.cancelled_owned()).await;
            if let Err(e) = result {
                error!("health server error: {e}");
            }
        });
    }

    let refresh = gateway.tokens.spawn(shutdown.clone());

    info!(
        upstream = %gateway.upstream_base_url.host_str().unwrap_or_default(),
        strategy = %config.strategy,
        "tokengate listening on {addr}"
    );
    let router = build_router(Arc::clone(&gateway));
    axum::serve(listener, router).with_graceful_shutdown(shutdown.clone().cancelled_owned()).await?;

    shutdown.cancel();
    credential::manager::join_refresh(refresh).await;
    info!("tokengate stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGTERM");
                shutdown.cancel();
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGINT");
                shutdown.cancel();
            }
        }
    });
}
