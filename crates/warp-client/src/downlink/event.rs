// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event downlinks: stateless, every inbound `event` body is forwarded to
//! subscribers and nothing is retained between them.

use crate::downlink::model::{DispatchAction, OpenKind};
use crate::value::Value;

#[derive(Default)]
pub struct EventModel;

impl EventModel {
    pub fn open_kind(&self) -> OpenKind {
        OpenKind::Link
    }

    pub fn handle_event(&self, body: Value) -> DispatchAction {
        DispatchAction::OnEvent(body)
    }
}

/// Callbacks an event downlink view may register.
#[derive(Default)]
pub struct EventCallbacks {
    pub on_event: Option<Box<dyn Fn(&Value) + Send + Sync>>,
}
