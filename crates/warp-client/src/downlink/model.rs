// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle state shared by every downlink kind: the `linked`/`synced`
//! signals and the open/close transition they gate.

use tokio::sync::watch;

use crate::value::Value;
use crate::warp::Envelope;

/// What a downlink does with an inbound event body. Kept as data rather
/// than invoking callbacks directly so [`super::manager::DownlinkManager`]
/// can fan a single action out to every view sharing the route.
pub enum DispatchAction {
    OnEvent(Value),
    DidSet { new: Value, old: Value },
    DidUpdate { key: Value, new: Value, old: Option<Value> },
    DidRemove { key: Value, old: Value },
}

/// The envelope a downlink sends the moment it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    Link,
    Sync,
}

impl OpenKind {
    pub fn envelope(self, node_uri: &str, lane_uri: &str) -> Envelope {
        match self {
            OpenKind::Link => Envelope::link(node_uri, lane_uri),
            OpenKind::Sync => Envelope::sync(node_uri, lane_uri),
        }
    }
}

/// `linked`/`synced` signals a model exposes so callers awaiting
/// `get_value`/`get` block until the handshake has actually completed.
pub struct LifecycleSignals {
    linked_tx: watch::Sender<bool>,
    synced_tx: watch::Sender<bool>,
}

impl LifecycleSignals {
    pub fn new() -> Self {
        let (linked_tx, _) = watch::channel(false);
        let (synced_tx, _) = watch::channel(false);
        LifecycleSignals { linked_tx, synced_tx }
    }

    pub fn mark_linked(&self) {
        let _ = self.linked_tx.send(true);
    }

    pub fn mark_synced(&self) {
        let _ = self.synced_tx.send(true);
    }

    pub fn mark_unlinked(&self) {
        let _ = self.linked_tx.send(false);
        let _ = self.synced_tx.send(false);
    }

    pub fn is_synced(&self) -> bool {
        *self.synced_tx.borrow()
    }

    pub async fn wait_synced(&self) {
        let mut rx = self.synced_tx.subscribe();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }
}

impl Default for LifecycleSignals {
    fn default() -> Self {
        Self::new()
    }
}
