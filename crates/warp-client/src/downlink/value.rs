// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value downlinks: hold a single current value, replaced wholesale by
//! every inbound `event`.

use tokio::sync::Mutex;

use crate::downlink::model::{DispatchAction, OpenKind};
use crate::value::Value;

pub struct ValueModel {
    current: Mutex<Value>,
}

impl ValueModel {
    pub fn new() -> Self {
        ValueModel { current: Mutex::new(Value::Absent) }
    }

    pub fn open_kind(&self) -> OpenKind {
        OpenKind::Sync
    }

    /// Replaces the held value with `body` (an `Absent` body is treated as
    /// no update to the value's presence, matching the original's
    /// `None`-as-absent convention) and returns the dispatch action
    /// carrying both the new and prior value.
    pub async fn handle_event(&self, body: Value) -> DispatchAction {
        let mut current = self.current.lock().await;
        let old = current.clone();
        *current = body.clone();
        DispatchAction::DidSet { new: body, old }
    }

    pub async fn get(&self) -> Value {
        self.current.lock().await.clone()
    }

    pub fn command_body(value: Value) -> Value {
        value
    }
}

impl Default for ValueModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Callbacks a value downlink view may register.
#[derive(Default)]
pub struct ValueCallbacks {
    pub did_set: Option<Box<dyn Fn(&Value, &Value) + Send + Sync>>,
}
