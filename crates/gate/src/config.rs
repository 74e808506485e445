// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::credential::StrategyKind;

/// Default directory holding the mounted secret files.
pub const DEFAULT_SECRETS_DIR: &str = "/etc/tokengate/secrets";

/// Credential-refreshing reverse proxy.
///
/// Secret values (upstream URL, credential endpoint, client id and secret)
/// are only ever read from files under `--secrets-dir`, never from flags or
/// the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "tokengate", version, about)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "TOKENGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "TOKENGATE_PORT")]
    pub port: u16,

    /// Optional port for a health-only listener.
    #[arg(long, env = "TOKENGATE_HEALTH_PORT")]
    pub health_port: Option<u16>,

    /// Directory containing the secret files.
    #[arg(long, default_value = DEFAULT_SECRETS_DIR, env = "TOKENGATE_SECRETS_DIR")]
    pub secrets_dir: PathBuf,

    /// Credential acquisition strategy: json-bearer or basic-form.
    #[arg(long, default_value = "json-bearer", env = "TOKENGATE_STRATEGY")]
    pub strategy: String,

    /// Scope requested by the json-bearer strategy.
    #[arg(long, default_value = "api", env = "TOKENGATE_SCOPE")]
    pub scope: String,

    /// Data-classification tag sent with json-bearer requests.
    #[arg(long, default_value = "internal", env = "TOKENGATE_DATA_CLASSIFICATION")]
    pub data_classification: String,

    /// Data-source tag sent with json-bearer requests.
    #[arg(long, default_value = "tokengate", env = "TOKENGATE_DATA_SOURCE")]
    pub data_source: String,

    /// Seconds between credential refreshes.
    #[arg(long, default_value_t = 60, env = "TOKENGATE_REFRESH_SECS")]
    pub refresh_secs: u64,

    /// Per-call timeout for upstream and credential requests, in seconds.
    #[arg(long, default_value_t = 30, env = "TOKENGATE_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: u64,

    /// Maximum idle pooled connections per upstream host.
    #[arg(long, default_value_t = 100, env = "TOKENGATE_POOL_MAX_IDLE")]
    pub pool_max_idle: usize,

    /// Seconds an idle pooled connection is kept.
    #[arg(long, default_value_t = 90, env = "TOKENGATE_POOL_IDLE_TIMEOUT_SECS")]
    pub pool_idle_timeout_secs: u64,

    /// Log format (json or text).
    #[arg(long, default_value = "json", env = "TOKENGATE_LOG_FORMAT")]
    pub log_format: String,

    /// Log level filter.
    #[arg(long, default_value = "info", env = "TOKENGATE_LOG_LEVEL")]
    pub log_level: String,
}

impl GatewayConfig {
    /// Reject flag combinations that can never serve traffic.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.strategy_kind()?;

        if self.refresh_secs == 0 {
            anyhow::bail!("--refresh-secs must be greater than zero");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("--upstream-timeout-secs must be greater than zero");
        }
        if self.port != 0 && self.health_port == Some(self.port) {
            anyhow::bail!("--health-port must differ from --port");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }

        Ok(())
    }

    pub fn strategy_kind(&self) -> anyhow::Result<StrategyKind> {
        self.strategy.parse()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
