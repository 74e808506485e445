// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reverse-proxy engine: forwards any inbound request to the upstream with
//! the current credential injected and streams the response back.

pub mod headers;
pub mod stream;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use reqwest::Url;

use crate::error::ErrorCode;
use crate::proxy::headers::{forwardable_request_headers, forwardable_response_headers};
use crate::proxy::stream::{chunked, CHUNK_SIZE};
use crate::state::Gateway;

/// Re-base an inbound path and query onto the upstream base URL.
///
/// The base path is kept as a prefix; the inbound query replaces any query
/// on the base.
pub fn resolve_upstream_url(base: &Url, uri: &Uri) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{}", uri.path()));
    url.set_query(uri.query());
    url.set_fragment(None);
    url
}

/// Fallback handler: every method and path lands here.
pub async fn forward(State(gw): State<Arc<Gateway>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let url = resolve_upstream_url(&gw.upstream_base_url, &parts.uri);

    let mut headers = forwardable_request_headers(&parts.headers);
    if let Err(e) = gw.tokens.inject(&mut headers).await {
        tracing::error!(err = %e, "failed to build credential headers");
        return ErrorCode::Internal
            .to_http_response("failed to build upstream request")
            .into_response();
    }

    let outbound = gw
        .http
        .request(parts.method.clone(), url)
        .headers(headers)
        .body(reqwest::Body::wrap_stream(body.into_data_stream()))
        .build();
    let outbound = match outbound {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(err = %e, "failed to build upstream request");
            return ErrorCode::Internal
                .to_http_response("failed to build upstream request")
                .into_response();
        }
    };

    let upstream = match gw.http.execute(outbound).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(method = %parts.method, path = %parts.uri.path(), err = %e, "upstream request failed");
            return ErrorCode::BadGateway.to_http_response("upstream unreachable").into_response();
        }
    };

    let status = upstream.status();
    let headers = forwardable_response_headers(upstream.headers());
    let body = Body::from_stream(chunked(upstream.bytes_stream(), CHUNK_SIZE, parts.uri.path()));

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
