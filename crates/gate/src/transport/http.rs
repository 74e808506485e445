// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::credential::manager::RefreshStatus;
use crate::state::Gateway;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub credential: RefreshStatus,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<Gateway>>) -> impl IntoResponse {
    let status = if s.shutdown.is_cancelled() { "stopping" } else { "running" };
    Json(HealthResponse { status: status.to_owned(), credential: s.tokens.status() })
}
