// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Header copying between the inbound and upstream legs.

use axum::http::HeaderMap;

/// Inbound headers that describe the client connection rather than the
/// request. The outbound client sets its own.
const REQUEST_SKIP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "trailer",
    "upgrade",
];

/// Upstream headers the server re-derives for the client connection.
const RESPONSE_SKIP: &[&str] = &["connection", "keep-alive", "proxy-connection", "transfer-encoding"];

fn copy_except(src: &HeaderMap, skip: &[&str]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(src.len());
    for (name, value) in src {
        if skip.contains(&name.as_str()) {
            continue;
        }
        // append keeps repeated headers (e.g. multiple Set-Cookie) intact.
        out.append(name.clone(), value.clone());
    }
    out
}

/// Copy every inbound header that is safe to send upstream.
///
/// Credential headers are overlaid afterwards, so they always win.
pub fn forwardable_request_headers(inbound: &HeaderMap) -> HeaderMap {
    copy_except(inbound, REQUEST_SKIP)
}

/// Copy every upstream response header for the client.
pub fn forwardable_response_headers(upstream: &HeaderMap) -> HeaderMap {
    copy_except(upstream, RESPONSE_SKIP)
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
