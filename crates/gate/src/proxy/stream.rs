// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response body forwarding in bounded chunks.

use std::fmt::Display;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// Largest body frame handed to the client connection at once.
pub const CHUNK_SIZE: usize = 32 * 1024;

struct ChunkState<S> {
    upstream: Pin<Box<S>>,
    pending: Bytes,
    path: String,
    done: bool,
}

/// Re-frame an upstream body into frames of at most `chunk_size` bytes.
///
/// Every upstream chunk is yielded as soon as it arrives, so the client sees
/// partial output without waiting for the full body. A read error is logged
/// and yielded as the final item: status and headers are already on the wire,
/// so the server aborts the response instead of terminating it cleanly, and
/// the client can tell the body was truncated.
pub fn chunked<S, E>(
    upstream: S,
    chunk_size: usize,
    path: &str,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let chunk_size = chunk_size.max(1);
    let state = ChunkState { upstream: Box::pin(upstream), pending: Bytes::new(), path: path.to_owned(), done: false };

    futures_util::stream::unfold(state, move |mut st| async move {
        loop {
            if st.done {
                return None;
            }
            if !st.pending.is_empty() {
                let n = st.pending.len().min(chunk_size);
                let frame = st.pending.split_to(n);
                return Some((Ok(frame), st));
            }
            match st.upstream.next().await {
                Some(Ok(bytes)) => st.pending = bytes,
                Some(Err(e)) => {
                    tracing::warn!(path = %st.path, err = %e, "upstream body interrupted, response truncated");
                    st.done = true;
                    let err = io::Error::new(io::ErrorKind::UnexpectedEof, e.to_string());
                    return Some((Err(err), st));
                }
                None => return None,
            }
        }
    })
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
