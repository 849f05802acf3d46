// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host URI normalization: `warp(s)://` is the scheme WARP client code is
//! written against, but the wire transport is always plain WebSocket.

use crate::error::WarpError;

/// Rewrites a `warp://`/`warps://` host URI to `ws://`/`wss://`. URIs
/// already using a `ws`/`wss` scheme pass through unchanged. Any other
/// scheme is rejected — the pool keys connections by this normalized form,
/// so an unrecognized scheme must fail loudly rather than silently
/// collide with an unrelated host.
pub fn normalize_host_uri(host_uri: &str) -> Result<String, WarpError> {
    if let Some(rest) = host_uri.strip_prefix("warps://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = host_uri.strip_prefix("warp://") {
        Ok(format!("ws://{rest}"))
    } else if host_uri.starts_with("ws://") || host_uri.starts_with("wss://") {
        Ok(host_uri.to_owned())
    } else {
        Err(WarpError::InvalidUri(host_uri.to_owned()))
    }
}

/// The `node_uri + "/" + lane_uri` key used to route envelopes to a
/// downlink manager.
pub fn route(node_uri: &str, lane_uri: &str) -> String {
    format!("{node_uri}/{lane_uri}")
}
