// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential acquisition and refresh.
//!
//! A [`CredentialStrategy`] knows how to exchange the client id/secret for an
//! access token and which headers carry that token upstream. The
//! [`manager::TokenManager`] owns the current token and is the only thing that
//! talks to a strategy.

pub mod basic_form;
pub mod json_bearer;
pub mod manager;
pub mod token;

use std::fmt;
use std::sync::Arc;

use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use futures_util::future::BoxFuture;

use crate::config::GatewayConfig;
use crate::error::FetchError;
use crate::secret::GatewaySecrets;

/// Header carrying the raw token for both strategies.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");

/// An opaque access token. Empty until the first successful refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn empty() -> Self {
        Self(Arc::from(""))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value marked sensitive so it is never printed by `Debug`.
    pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&self.0)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            write!(f, "Credential(<{} bytes>)", self.0.len())
        }
    }
}

/// Pluggable client-credentials exchange.
pub trait CredentialStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Exchange the client id/secret for a fresh credential. No retries.
    fn fetch<'a>(
        &'a self,
        http: &'a reqwest::Client,
        secrets: &'a GatewaySecrets,
    ) -> BoxFuture<'a, Result<Credential, FetchError>>;

    /// Overlay this strategy's credential headers onto `headers`.
    ///
    /// Uses `insert`, so any same-named inbound header is replaced.
    fn inject(
        &self,
        headers: &mut HeaderMap,
        credential: &Credential,
    ) -> Result<(), InvalidHeaderValue>;
}

/// Which strategy to run, selected by `--strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// JSON body, bearer + `Api-Key` + metadata headers.
    JsonBearer,
    /// HTTP Basic + form body, `Api-Key` only.
    BasicForm,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonBearer => "json-bearer",
            Self::BasicForm => "basic-form",
        }
    }

    /// Construct the strategy with its config-derived settings.
    pub fn build(&self, config: &GatewayConfig) -> anyhow::Result<Arc<dyn CredentialStrategy>> {
        Ok(match self {
            Self::JsonBearer => Arc::new(json_bearer::JsonBearer::new(
                &config.scope,
                &config.data_classification,
                &config.data_source,
            )?),
            Self::BasicForm => Arc::new(basic_form::BasicForm),
        })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json-bearer" | "json" => Ok(Self::JsonBearer),
            "basic-form" | "basic" => Ok(Self::BasicForm),
            other => anyhow::bail!("invalid credential strategy: {other}"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
