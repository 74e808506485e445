// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token manager: owns the current credential and refreshes it on a timer.
//!
//! A failed refresh never clears the stored credential; the last good value
//! keeps being served until a later refresh succeeds.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderMap;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::credential::{Credential, CredentialStrategy};
use crate::error::FetchError;
use crate::secret::GatewaySecrets;

/// Where the manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// No refresh has succeeded yet; requests carry an empty credential.
    Uninitialized,
    /// The most recent refresh succeeded.
    Valid,
    /// A refresh succeeded earlier but the most recent one failed.
    Stale,
}

/// Point-in-time view of refresh health. Never includes the credential.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshStatus {
    pub state: RefreshState,
    pub strategy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub attempts: u64,
}

pub struct TokenManager {
    current: RwLock<Credential>,
    strategy: Arc<dyn CredentialStrategy>,
    secrets: Arc<GatewaySecrets>,
    http: reqwest::Client,
    interval: Duration,
    attempts: AtomicU64,
    consecutive_failures: AtomicU32,
    /// Epoch millis of the last success, 0 if never.
    last_success_ms: AtomicU64,
}

impl TokenManager {
    pub fn new(
        strategy: Arc<dyn CredentialStrategy>,
        secrets: Arc<GatewaySecrets>,
        http: reqwest::Client,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(Credential::empty()),
            strategy,
            secrets,
            http,
            interval,
            attempts: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            last_success_ms: AtomicU64::new(0),
        })
    }

    /// The last successfully fetched credential, or empty if none yet.
    pub async fn current(&self) -> Credential {
        self.current.read().await.clone()
    }

    /// Overlay the current credential's headers onto an outbound request.
    pub async fn inject(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let credential = self.current().await;
        self.strategy.inject(headers, &credential)
    }

    /// Run one refresh attempt.
    ///
    /// On success the stored credential is replaced; on failure it is kept.
    pub async fn refresh_once(&self) -> Result<(), FetchError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match self.strategy.fetch(&self.http, &self.secrets).await {
            Ok(credential) => {
                *self.current.write().await = credential;
                self.consecutive_failures.store(0, Ordering::Relaxed);
                self.last_success_ms.store(epoch_ms(), Ordering::Relaxed);
                tracing::info!(strategy = self.strategy.name(), "credential refreshed");
                Ok(())
            }
            Err(e) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    strategy = self.strategy.name(),
                    failures,
                    err = %e,
                    "credential refresh failed, keeping previous credential"
                );
                Err(e)
            }
        }
    }

    /// Spawn the refresh loop.
    ///
    /// The first attempt runs immediately at startup rather than after one
    /// interval, which shortens the window where requests carry an empty
    /// credential. Later attempts run once per interval until `shutdown` is
    /// cancelled. An in-flight attempt is abandoned on shutdown.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(manager.interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {}
                }
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = manager.refresh_once() => {}
                }
            }
            tracing::debug!("credential refresh loop stopped");
        })
    }

    pub fn status(&self) -> RefreshStatus {
        let last = self.last_success_ms.load(Ordering::Relaxed);
        let consecutive_failures = self.consecutive_failures.load(Ordering::Relaxed);
        let state = match (last, consecutive_failures) {
            (0, _) => RefreshState::Uninitialized,
            (_, 0) => RefreshState::Valid,
            _ => RefreshState::Stale,
        };
        RefreshStatus {
            state,
            strategy: self.strategy.name(),
            last_success_ms: (last != 0).then_some(last),
            consecutive_failures,
            attempts: self.attempts.load(Ordering::Relaxed),
        }
    }
}

/// Wait for a spawned refresh loop to finish.
///
/// Returns `false` and logs the `JoinError` if the task panicked or was
/// aborted.
pub async fn join_refresh(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(err = %e, "credential refresh task failed");
            false
        }
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
