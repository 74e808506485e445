// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token endpoint response handling shared by both strategies.

use axum::http::HeaderValue;

use crate::credential::Credential;
use crate::error::FetchError;

/// How much of a failed response body to keep in the error message.
const ERROR_BODY_PREFIX: usize = 200;

/// Turn a credential endpoint response into a credential.
///
/// Anything but `200 OK` is an endpoint error.
pub async fn read_token_response(resp: reqwest::Response) -> Result<Credential, FetchError> {
    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        let text = resp.text().await.unwrap_or_default();
        let snippet: String = text.chars().take(ERROR_BODY_PREFIX).collect();
        return Err(FetchError::Endpoint(format!("status {status}: {snippet}")));
    }

    let body = resp.bytes().await.map_err(|e| FetchError::Endpoint(e.to_string()))?;
    parse_access_token(&body)
}

/// Extract the string `access_token` field from a JSON token response.
///
/// `expires_in` is accepted but not acted on; refresh runs on a fixed interval.
pub fn parse_access_token(body: &[u8]) -> Result<Credential, FetchError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::Format(format!("invalid JSON: {e}")))?;

    let token = value
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| FetchError::Format("missing string access_token".to_owned()))?;

    if HeaderValue::from_str(token).is_err() {
        return Err(FetchError::Format("access_token is not a valid header value".to_owned()));
    }

    if let Some(expires_in) = value.get("expires_in").and_then(serde_json::Value::as_u64) {
        tracing::debug!(expires_in, "credential endpoint reported expiry (not tracked)");
    }

    Ok(Credential::new(token))
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
