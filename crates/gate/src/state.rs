// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::credential::manager::TokenManager;
use crate::credential::CredentialStrategy;
use crate::secret::GatewaySecrets;

/// Everything a request handler needs, built once at startup.
pub struct Gateway {
    pub config: GatewayConfig,
    pub upstream_base_url: Url,
    /// Pooled client shared by the proxy and the credential exchange.
    pub http: reqwest::Client,
    pub tokens: Arc<TokenManager>,
    pub shutdown: CancellationToken,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        secrets: GatewaySecrets,
        strategy: Arc<dyn CredentialStrategy>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .pool_max_idle_per_host(config.pool_max_idle)
            .pool_idle_timeout(config.pool_idle_timeout())
            .build()?;

        let upstream_base_url = secrets.upstream_base_url.clone();
        let tokens =
            TokenManager::new(strategy, Arc::new(secrets), http.clone(), config.refresh_interval());

        Ok(Self { config, upstream_base_url, http, tokens, shutdown })
    }
}
