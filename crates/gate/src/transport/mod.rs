// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP listeners for the gateway.

pub mod http;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::proxy;
use crate::state::Gateway;

/// Build the proxy `Router`: every method and path is forwarded upstream.
pub fn build_router(state: Arc<Gateway>) -> Router {
    Router::new().fallback(proxy::forward).layer(TraceLayer::new_for_http()).with_state(state)
}

/// Build a minimal health-only router (for `--health-port`).
///
/// Kept off the proxy port so it never shadows an upstream path.
pub fn build_health_router(state: Arc<Gateway>) -> Router {
    Router::new().route("/api/v1/health", get(http::health)).with_state(state)
}
