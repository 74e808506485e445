// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes the gateway itself can answer with.
///
/// Upstream statuses are forwarded untouched; these only cover failures that
/// happen before an upstream response exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    BadGateway,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadGateway => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadGateway => "BAD_GATEWAY",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Failure loading one startup secret. Always fatal.
#[derive(Debug)]
pub enum SecretError {
    NotFound { name: String },
    Read { name: String, source: std::io::Error },
    Empty { name: String },
    InvalidUrl { name: String, reason: String },
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "secret {name:?} not found"),
            Self::Read { name, source } => write!(f, "failed to read secret {name:?}: {source}"),
            Self::Empty { name } => write!(f, "secret {name:?} is empty"),
            // The value itself is deliberately left out.
            Self::InvalidUrl { name, reason } => {
                write!(f, "secret {name:?} is not a valid URL: {reason}")
            }
        }
    }
}

impl std::error::Error for SecretError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure fetching a credential from the credential endpoint.
///
/// Recoverable: the token manager logs it and keeps the previous credential.
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure or a non-200 status.
    Endpoint(String),
    /// Body was not JSON or had no string `access_token`.
    Format(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint(msg) => write!(f, "credential endpoint error: {msg}"),
            Self::Format(msg) => write!(f, "credential response format error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
