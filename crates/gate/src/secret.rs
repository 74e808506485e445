// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup secrets: the upstream address and the client credentials.
//!
//! Loaded once from mounted files before anything else starts. Every failure
//! here is fatal.

use std::fmt;
use std::path::PathBuf;

use reqwest::Url;

use crate::error::SecretError;

pub const UPSTREAM_BASE_URL: &str = "upstream-base-url";
pub const CREDENTIAL_ENDPOINT: &str = "credential-endpoint";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";

/// Source of named secret values.
pub trait SecretProvider {
    /// Load a secret by name, with surrounding whitespace trimmed.
    fn load(&self, name: &str) -> Result<String, SecretError>;
}

/// Reads each secret from `<dir>/<name>`.
#[derive(Debug, Clone)]
pub struct FileSecretProvider {
    dir: PathBuf,
}

impl FileSecretProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SecretProvider for FileSecretProvider {
    fn load(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(contents.trim().to_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretError::NotFound { name: name.to_owned() })
            }
            Err(source) => Err(SecretError::Read { name: name.to_owned(), source }),
        }
    }
}

/// A string that never shows up in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// The four startup values, immutable once loaded.
#[derive(Debug, Clone)]
pub struct GatewaySecrets {
    pub upstream_base_url: Url,
    pub credential_endpoint: Url,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl GatewaySecrets {
    /// Load all four secrets, failing on the first missing or malformed one.
    pub fn load(provider: &dyn SecretProvider) -> Result<Self, SecretError> {
        let upstream_base_url = load_url(provider, UPSTREAM_BASE_URL)?;
        let credential_endpoint = load_url(provider, CREDENTIAL_ENDPOINT)?;
        let client_id = load_non_empty(provider, CLIENT_ID)?;
        let client_secret = SecretString::new(load_non_empty(provider, CLIENT_SECRET)?);
        Ok(Self { upstream_base_url, credential_endpoint, client_id, client_secret })
    }
}

fn load_non_empty(provider: &dyn SecretProvider, name: &str) -> Result<String, SecretError> {
    let value = provider.load(name)?;
    if value.is_empty() {
        return Err(SecretError::Empty { name: name.to_owned() });
    }
    Ok(value)
}

fn load_url(provider: &dyn SecretProvider, name: &str) -> Result<Url, SecretError> {
    let raw = load_non_empty(provider, name)?;
    let url = Url::parse(&raw)
        .map_err(|e| SecretError::InvalidUrl { name: name.to_owned(), reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SecretError::InvalidUrl {
            name: name.to_owned(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
