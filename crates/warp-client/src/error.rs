// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Error taxonomy for the warp client core.
///
/// `Transport` and `Protocol` failures are reported through the warning sink
/// (see [`crate::client::WarningSink`]) rather than returned here; this enum
/// covers failures that a caller must be able to match on synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarpError {
    /// Operation attempted on a downlink view that has already been closed.
    ViewClosed,
    /// A downlink was opened at a route already owned by a manager of a
    /// different kind (e.g. an event downlink at a route with an open value
    /// downlink).
    KindMismatch { route: String },
    /// A host, node, or lane URI failed to parse or normalize.
    InvalidUri(String),
    /// The registered callback type did not match what the call site expected.
    CallbackMismatch,
}

impl WarpError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewClosed => "VIEW_CLOSED",
            Self::KindMismatch { .. } => "KIND_MISMATCH",
            Self::InvalidUri(_) => "INVALID_URI",
            Self::CallbackMismatch => "CALLBACK_MISMATCH",
        }
    }
}

impl fmt::Display for WarpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewClosed => write!(f, "downlink view is closed"),
            Self::KindMismatch { route } => {
                write!(f, "route {route} is already open with a different downlink kind")
            }
            Self::InvalidUri(uri) => write!(f, "invalid uri: {uri}"),
            Self::CallbackMismatch => write!(f, "callback signature mismatch"),
        }
    }
}

impl std::error::Error for WarpError {}
