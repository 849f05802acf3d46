// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-route fan-out: one [`DownlinkManager`] owns the single downlink
//! model backing every view opened against the same `(node_uri, lane_uri)`
//! on a given connection, and the [`ManagerPool`] that owns all of them
//! for a connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::downlink::event::{EventCallbacks, EventModel};
use crate::downlink::map::{MapCallbacks, MapModel};
use crate::downlink::model::{DispatchAction, LifecycleSignals};
use crate::downlink::value::{ValueCallbacks, ValueModel};
use crate::error::WarpError;
use crate::transport::connection::EnvelopeSink;
use crate::transport::WsConnection;
use crate::value::Value;
use crate::warp::uri::route;
use crate::warp::Envelope;

/// Which downlink kind a manager's model implements, used to reject a new
/// view whose kind doesn't match an already-open route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkKind {
    Event,
    Value,
    Map,
}

enum ModelBody {
    Event(EventModel),
    Value(ValueModel),
    Map(MapModel),
}

/// The callback set a single view registered with its manager.
pub enum ViewCallbacks {
    Event(EventCallbacks),
    Value(ValueCallbacks),
    Map(MapCallbacks),
}

impl ViewCallbacks {
    fn kind(&self) -> DownlinkKind {
        match self {
            ViewCallbacks::Event(_) => DownlinkKind::Event,
            ViewCallbacks::Value(_) => DownlinkKind::Value,
            ViewCallbacks::Map(_) => DownlinkKind::Map,
        }
    }
}

/// Lifecycle callbacks common to every downlink kind, registered
/// alongside a view's kind-specific data callbacks.
#[derive(Default)]
pub struct LifecycleCallbacks {
    pub will_link: Option<Box<dyn Fn() + Send + Sync>>,
    pub did_link: Option<Box<dyn Fn() + Send + Sync>>,
    pub will_sync: Option<Box<dyn Fn() + Send + Sync>>,
    pub did_sync: Option<Box<dyn Fn() + Send + Sync>>,
    pub will_unlink: Option<Box<dyn Fn() + Send + Sync>>,
    pub did_unlink: Option<Box<dyn Fn() + Send + Sync>>,
}

enum LifecycleEvent {
    DidLink,
    DidSync,
    DidUnlink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerStatus {
    Closed,
    Opening,
    Open,
}

/// Owns one downlink model and fans its lifecycle/data events out to every
/// view sharing its route.
pub struct DownlinkManager {
    node_uri: String,
    lane_uri: String,
    connection: Arc<WsConnection>,
    body: ModelBody,
    lifecycle: LifecycleSignals,
    views: Mutex<indexmap::IndexMap<u64, (LifecycleCallbacks, ViewCallbacks)>>,
    status: Mutex<ManagerStatus>,
}

impl DownlinkManager {
    fn new(node_uri: String, lane_uri: String, connection: Arc<WsConnection>, body: ModelBody) -> Self {
        DownlinkManager {
            node_uri,
            lane_uri,
            connection,
            body,
            lifecycle: LifecycleSignals::new(),
            views: Mutex::new(indexmap::IndexMap::new()),
            status: Mutex::new(ManagerStatus::Closed),
        }
    }

    pub fn kind(&self) -> DownlinkKind {
        match &self.body {
            ModelBody::Event(_) => DownlinkKind::Event,
            ModelBody::Value(_) => DownlinkKind::Value,
            ModelBody::Map(_) => DownlinkKind::Map,
        }
    }

    /// Registers a view's callbacks, opening the manager (sending the
    /// initial `link`/`sync`) if this is the first one.
    pub async fn add_view(
        self: &Arc<Self>,
        view_id: u64,
        lifecycle: LifecycleCallbacks,
        callbacks: ViewCallbacks,
    ) -> Result<(), WarpError> {
        if callbacks.kind() != self.kind() {
            return Err(WarpError::KindMismatch { route: route(&self.node_uri, &self.lane_uri) });
        }
        let mut views = self.views.lock().await;
        let was_empty = views.is_empty();
        views.insert(view_id, (lifecycle, callbacks));
        drop(views);
        if was_empty {
            self.open().await;
        }
        Ok(())
    }

    /// Deregisters a view. Returns `true` if no views remain.
    pub async fn remove_view(&self, view_id: u64) -> bool {
        let mut views = self.views.lock().await;
        if let Some((lifecycle, _)) = views.get(&view_id) {
            if let Some(f) = &lifecycle.will_unlink {
                f();
            }
        }
        views.shift_remove(&view_id);
        let empty = views.is_empty();
        drop(views);
        if empty {
            self.close().await;
        }
        empty
    }

    async fn open(self: &Arc<Self>) {
        *self.status.lock().await = ManagerStatus::Opening;
        let open_kind = match &self.body {
            ModelBody::Event(m) => m.open_kind(),
            ModelBody::Value(m) => m.open_kind(),
            ModelBody::Map(m) => m.open_kind(),
        };
        {
            let views = self.views.lock().await;
            for (lifecycle, _) in views.values() {
                if let Some(f) = &lifecycle.will_link {
                    f();
                }
                if matches!(open_kind, crate::downlink::model::OpenKind::Sync) {
                    if let Some(f) = &lifecycle.will_sync {
                        f();
                    }
                }
            }
        }
        self.connection.send(&open_kind.envelope(&self.node_uri, &self.lane_uri));
        *self.status.lock().await = ManagerStatus::Open;
    }

    async fn close(&self) {
        self.connection.send(&Envelope::unlink(&self.node_uri, &self.lane_uri));
        self.lifecycle.mark_unlinked();
        *self.status.lock().await = ManagerStatus::Closed;
    }

    pub fn send_command(&self, body: Value) {
        self.connection.send(&Envelope::command(&self.node_uri, &self.lane_uri, body));
    }

    pub async fn get_value(&self) -> Value {
        self.lifecycle.wait_synced().await;
        match &self.body {
            ModelBody::Value(m) => m.get().await,
            _ => Value::Absent,
        }
    }

    pub async fn get_map_entry(&self, key: &Value) -> Option<Value> {
        self.lifecycle.wait_synced().await;
        match &self.body {
            ModelBody::Map(m) => m.get(key).await,
            _ => None,
        }
    }

    pub async fn get_map_all(&self) -> Vec<(Value, Value)> {
        self.lifecycle.wait_synced().await;
        match &self.body {
            ModelBody::Map(m) => m.get_all().await,
            _ => Vec::new(),
        }
    }

    /// Applies an inbound envelope to the model and fans the resulting
    /// lifecycle/data callbacks out to every registered view, in view
    /// insertion order.
    pub async fn receive_message(&self, envelope: Envelope) {
        match envelope {
            Envelope::Linked(_) => {
                self.lifecycle.mark_linked();
                self.fire_lifecycle(LifecycleEvent::DidLink).await;
            }
            Envelope::Synced(_) => {
                self.lifecycle.mark_synced();
                self.fire_lifecycle(LifecycleEvent::DidSync).await;
            }
            Envelope::Unlinked(_) => {
                self.lifecycle.mark_unlinked();
                self.fire_lifecycle(LifecycleEvent::DidUnlink).await;
            }
            Envelope::Event(lane) => {
                let actions = match &self.body {
                    ModelBody::Event(m) => vec![m.handle_event(lane.body)],
                    ModelBody::Value(m) => vec![m.handle_event(lane.body).await],
                    ModelBody::Map(m) => m.handle_event(lane.body).await,
                };
                for action in actions {
                    self.dispatch_action(action).await;
                }
            }
            _ => {}
        }
    }

    async fn fire_lifecycle(&self, event: LifecycleEvent) {
        let views = self.views.lock().await;
        for (lifecycle, _) in views.values() {
            let callback = match event {
                LifecycleEvent::DidLink => &lifecycle.did_link,
                LifecycleEvent::DidSync => &lifecycle.did_sync,
                LifecycleEvent::DidUnlink => &lifecycle.did_unlink,
            };
            if let Some(f) = callback {
                f();
            }
        }
    }

    async fn dispatch_action(&self, action: DispatchAction) {
        let views = self.views.lock().await;
        for (_, callbacks) in views.values() {
            match (&action, callbacks) {
                (DispatchAction::OnEvent(body), ViewCallbacks::Event(cb)) => {
                    if let Some(f) = &cb.on_event {
                        f(body);
                    }
                }
                (DispatchAction::DidSet { new, old }, ViewCallbacks::Value(cb)) => {
                    if let Some(f) = &cb.did_set {
                        f(new, old);
                    }
                }
                (DispatchAction::DidUpdate { key, new, old }, ViewCallbacks::Map(cb)) => {
                    if let Some(f) = &cb.did_update {
                        f(key, new, old.as_ref());
                    }
                }
                (DispatchAction::DidRemove { key, old }, ViewCallbacks::Map(cb)) => {
                    if let Some(f) = &cb.did_remove {
                        f(key, old);
                    }
                }
                _ => {}
            }
        }
    }

}

/// Host-keyed map from WARP route to the manager owning it. One pool per
/// connection — shared across all views that talk to that host.
#[derive(Default)]
pub struct ManagerPool {
    managers: RwLock<HashMap<String, Arc<DownlinkManager>>>,
    next_view_id: AtomicU64,
}

impl ManagerPool {
    pub fn new() -> Self {
        ManagerPool { managers: RwLock::new(HashMap::new()), next_view_id: AtomicU64::new(1) }
    }

    pub fn next_view_id(&self) -> u64 {
        self.next_view_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the manager for `node_uri/lane_uri`, creating one of `kind`
    /// if absent.
    pub async fn get_or_create(
        &self,
        node_uri: &str,
        lane_uri: &str,
        connection: Arc<WsConnection>,
        kind: DownlinkKind,
    ) -> Result<Arc<DownlinkManager>, WarpError> {
        let key = route(node_uri, lane_uri);
        {
            let managers = self.managers.read().await;
            if let Some(m) = managers.get(&key) {
                if m.kind() != kind {
                    return Err(WarpError::KindMismatch { route: key });
                }
                return Ok(Arc::clone(m));
            }
        }
        let mut managers = self.managers.write().await;
        if let Some(m) = managers.get(&key) {
            if m.kind() != kind {
                return Err(WarpError::KindMismatch { route: key });
            }
            return Ok(Arc::clone(m));
        }
        let body = match kind {
            DownlinkKind::Event => ModelBody::Event(EventModel::default()),
            DownlinkKind::Value => ModelBody::Value(ValueModel::new()),
            DownlinkKind::Map => ModelBody::Map(MapModel::new()),
        };
        let manager = Arc::new(DownlinkManager::new(node_uri.to_owned(), lane_uri.to_owned(), connection, body));
        managers.insert(key, Arc::clone(&manager));
        Ok(manager)
    }

    pub async fn remove_if_empty(&self, node_uri: &str, lane_uri: &str) {
        let key = route(node_uri, lane_uri);
        let is_empty = {
            let managers = self.managers.read().await;
            match managers.get(&key) {
                Some(m) => m.views.lock().await.is_empty(),
                None => return,
            }
        };
        if is_empty {
            self.managers.write().await.remove(&key);
        }
    }

    async fn route_to(&self, key: &str, envelope: Envelope) {
        let manager = self.managers.read().await.get(key).cloned();
        if let Some(manager) = manager {
            manager.receive_message(envelope).await;
        }
    }
}

/// Adapts [`ManagerPool`] to the connection's envelope-routing trait. The
/// actual dispatch is async (it takes the manager table lock), so each
/// call spawns a task rather than blocking the connection's read loop.
pub struct PoolEnvelopeSink {
    pub pool: Arc<ManagerPool>,
    pub did_auth: Option<Box<dyn Fn(&Envelope) + Send + Sync>>,
    pub did_deauth: Option<Box<dyn Fn(&Envelope) + Send + Sync>>,
}

impl EnvelopeSink for PoolEnvelopeSink {
    fn route_envelope(&self, env: Envelope) {
        if let Some(key) = env.route() {
            let pool = Arc::clone(&self.pool);
            tokio::spawn(async move { pool.route_to(&key, env).await });
        }
    }

    fn did_auth(&self, env: &Envelope) {
        if let Some(f) = &self.did_auth {
            f(env);
        }
    }

    fn did_deauth(&self, env: &Envelope) {
        if let Some(f) = &self.did_deauth {
            f(env);
        }
    }
}
