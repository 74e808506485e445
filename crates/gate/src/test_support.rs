// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: gateway builder and in-process servers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::credential::StrategyKind;
use crate::secret::{GatewaySecrets, SecretString};
use crate::state::Gateway;

/// Builder for constructing a [`Gateway`] in tests with sensible defaults.
pub struct GatewayBuilder {
    upstream: String,
    credential_endpoint: String,
    strategy: StrategyKind,
    upstream_timeout_secs: u64,
    refresh_secs: u64,
}

impl GatewayBuilder {
    pub fn new(upstream: impl Into<String>, credential_endpoint: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            credential_endpoint: credential_endpoint.into(),
            strategy: StrategyKind::JsonBearer,
            upstream_timeout_secs: 5,
            refresh_secs: 3600,
        }
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn upstream_timeout_secs(mut self, secs: u64) -> Self {
        self.upstream_timeout_secs = secs;
        self
    }

    pub fn refresh_secs(mut self, secs: u64) -> Self {
        self.refresh_secs = secs;
        self
    }

    pub fn config(&self) -> anyhow::Result<GatewayConfig> {
        Ok(GatewayConfig::try_parse_from([
            "tokengate".to_owned(),
            "--host".to_owned(),
            "127.0.0.1".to_owned(),
            "--port".to_owned(),
            "0".to_owned(),
            "--strategy".to_owned(),
            self.strategy.to_string(),
            "--upstream-timeout-secs".to_owned(),
            self.upstream_timeout_secs.to_string(),
            "--refresh-secs".to_owned(),
            self.refresh_secs.to_string(),
        ])?)
    }

    pub fn build(self) -> anyhow::Result<Arc<Gateway>> {
        crate::ensure_crypto();
        let config = self.config()?;
        let secrets = GatewaySecrets {
            upstream_base_url: Url::parse(&self.upstream)?,
            credential_endpoint: Url::parse(&self.credential_endpoint)?,
            client_id: "test-client".to_owned(),
            client_secret: SecretString::new("test-secret"),
        };
        let strategy = self.strategy.build(&config)?;
        Ok(Arc::new(Gateway::new(config, secrets, strategy, CancellationToken::new())?))
    }
}

/// Serve `router` on a random localhost port.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_router(
    router: Router,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}

/// Serve the gateway's proxy router on a random localhost port.
pub async fn spawn_gateway(
    gateway: Arc<Gateway>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    spawn_router(crate::transport::build_router(gateway)).await
}

/// An address nothing is listening on.
pub fn closed_addr() -> anyhow::Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?)
}
