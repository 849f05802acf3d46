// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A streaming client for the WARP protocol over WebSockets: a Recon
//! codec, a per-host connection pool with automatic reconnection, and
//! event/value/map downlink state machines multiplexed over it.

pub mod client;
pub mod downlink;
pub mod error;
pub mod recon;
pub mod transport;
pub mod value;
pub mod warp;

pub use client::{RetryConfig, WarpClient};
pub use error::WarpError;
pub use value::Value;
