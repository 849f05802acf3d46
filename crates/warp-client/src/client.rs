// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The core-exposed surface: a minimal [`WarpClient`] wiring the
//! connection pool and downlink managers into `open_*_downlink`/`command`.
//! This is not the excluded facade — it performs no process bootstrapping
//! or thread management, only the wiring a facade (or a test) needs to
//! drive the core directly.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::downlink::manager::{DownlinkKind, LifecycleCallbacks, ManagerPool, PoolEnvelopeSink, ViewCallbacks};
use crate::downlink::{event::EventCallbacks, map::MapCallbacks, value::ValueCallbacks};
use crate::error::WarpError;
use crate::transport::{ConnectionPool, RetryStrategy};
use crate::value::Value;
use crate::warp::Envelope;

/// Tunables for the connection pool a [`WarpClient`] owns. Constructed
/// programmatically — wiring this up to CLI flags or environment
/// variables is a facade concern, out of scope here.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub default_strategy: RetryStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig { default_strategy: RetryStrategy::default() }
    }
}

/// Receives non-fatal warnings the core would otherwise only log.
/// Independent of `tracing`: every warning is logged via `tracing::warn!`
/// regardless of whether a sink is registered, so a facade with no sink
/// still gets the information somewhere.
pub type WarningSink = Box<dyn Fn(&str) + Send + Sync>;

/// Owns the connection pool and per-host downlink manager pools. Cheap to
/// clone (an `Arc` internally would be the facade's job; callers
/// typically wrap a `WarpClient` in their own `Arc`).
pub struct WarpClient {
    connections: ConnectionPool,
    host_pools: RwLock<HashMap<String, Arc<ManagerPool>>>,
    warning_sink: Option<WarningSink>,
}

impl WarpClient {
    pub fn new(config: RetryConfig) -> Arc<Self> {
        Arc::new(WarpClient {
            connections: ConnectionPool::new(config.default_strategy),
            host_pools: RwLock::new(HashMap::new()),
            warning_sink: None,
        })
    }

    pub fn with_warning_sink(config: RetryConfig, sink: WarningSink) -> Arc<Self> {
        Arc::new(WarpClient {
            connections: ConnectionPool::new(config.default_strategy),
            host_pools: RwLock::new(HashMap::new()),
            warning_sink: Some(sink),
        })
    }

    fn warn(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!("{message}");
        if let Some(sink) = &self.warning_sink {
            sink(message);
        }
    }

    async fn pool_for_host(self: &Arc<Self>, host_uri: &str) -> Arc<ManagerPool> {
        if let Some(pool) = self.host_pools.read().await.get(host_uri) {
            return Arc::clone(pool);
        }
        let mut pools = self.host_pools.write().await;
        Arc::clone(pools.entry(host_uri.to_owned()).or_insert_with(|| Arc::new(ManagerPool::new())))
    }

    async fn open_manager(
        self: &Arc<Self>,
        host_uri: &str,
        node_uri: &str,
        lane_uri: &str,
        keep_linked: bool,
        keep_synced: bool,
        kind: DownlinkKind,
    ) -> Result<(Arc<crate::downlink::DownlinkManager>, Arc<ManagerPool>), WarpError> {
        let manager_pool = self.pool_for_host(host_uri).await;
        let sink: Arc<dyn crate::transport::EnvelopeSink> =
            Arc::new(PoolEnvelopeSink { pool: Arc::clone(&manager_pool), did_auth: None, did_deauth: None });
        let connection = self.connections.add_subscriber(host_uri, sink, keep_linked, keep_synced).await?;
        let manager = manager_pool.get_or_create(node_uri, lane_uri, connection, kind).await.inspect_err(|err| {
            self.warn(format!("failed to open downlink at {host_uri}/{node_uri}/{lane_uri}: {err}"));
        })?;
        Ok((manager, manager_pool))
    }

    /// Sends a one-shot `command` envelope without opening a persistent
    /// downlink. The connection for `host_uri` is opened if necessary but
    /// is not kept alive afterward unless some other downlink is using it.
    pub async fn command(
        self: &Arc<Self>,
        host_uri: &str,
        node_uri: &str,
        lane_uri: &str,
        body: Value,
    ) -> Result<(), WarpError> {
        let manager_pool = self.pool_for_host(host_uri).await;
        let sink: Arc<dyn crate::transport::EnvelopeSink> =
            Arc::new(PoolEnvelopeSink { pool: manager_pool, did_auth: None, did_deauth: None });
        let connection = self.connections.get_connection(host_uri, sink).await?;
        connection.send(&Envelope::command(node_uri, lane_uri, body));
        Ok(())
    }

    pub fn open_event_downlink(self: &Arc<Self>) -> EventDownlinkBuilder {
        EventDownlinkBuilder {
            client: Arc::clone(self),
            host_uri: String::new(),
            node_uri: String::new(),
            lane_uri: String::new(),
            keep_linked: false,
            keep_synced: false,
            callbacks: EventCallbacks::default(),
            lifecycle: LifecycleCallbacks::default(),
        }
    }

    pub fn open_value_downlink(self: &Arc<Self>) -> ValueDownlinkBuilder {
        ValueDownlinkBuilder {
            client: Arc::clone(self),
            host_uri: String::new(),
            node_uri: String::new(),
            lane_uri: String::new(),
            keep_linked: false,
            keep_synced: false,
            callbacks: ValueCallbacks::default(),
            lifecycle: LifecycleCallbacks::default(),
        }
    }

    pub fn open_map_downlink(self: &Arc<Self>) -> MapDownlinkBuilder {
        MapDownlinkBuilder {
            client: Arc::clone(self),
            host_uri: String::new(),
            node_uri: String::new(),
            lane_uri: String::new(),
            keep_linked: false,
            keep_synced: false,
            callbacks: MapCallbacks::default(),
            lifecycle: LifecycleCallbacks::default(),
        }
    }
}

/// Builder for an event downlink view. `open()` validates the URIs, opens
/// (or joins) the manager for the route, and registers the callbacks.
pub struct EventDownlinkBuilder {
    client: Arc<WarpClient>,
    host_uri: String,
    node_uri: String,
    lane_uri: String,
    keep_linked: bool,
    keep_synced: bool,
    callbacks: EventCallbacks,
    lifecycle: LifecycleCallbacks,
}

impl EventDownlinkBuilder {
    pub fn set_host_uri(mut self, uri: impl Into<String>) -> Self {
        self.host_uri = uri.into();
        self
    }
    pub fn set_node_uri(mut self, uri: impl Into<String>) -> Self {
        self.node_uri = uri.into();
        self
    }
    pub fn set_lane_uri(mut self, uri: impl Into<String>) -> Self {
        self.lane_uri = uri.into();
        self
    }
    pub fn keep_linked(mut self, v: bool) -> Self {
        self.keep_linked = v;
        self
    }
    pub fn on_event(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.callbacks.on_event = Some(Box::new(f));
        self
    }
    pub fn did_link(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.lifecycle.did_link = Some(Box::new(f));
        self
    }

    pub async fn open(self) -> Result<EventDownlinkView, WarpError> {
        let (manager, pool) = self
            .client
            .open_manager(&self.host_uri, &self.node_uri, &self.lane_uri, self.keep_linked, false, DownlinkKind::Event)
            .await?;
        let view_id = pool.next_view_id();
        manager.add_view(view_id, self.lifecycle, ViewCallbacks::Event(self.callbacks)).await?;
        Ok(EventDownlinkView {
            manager,
            manager_pool: pool,
            node_uri: self.node_uri,
            lane_uri: self.lane_uri,
            view_id,
            closed: false,
        })
    }
}

/// An open event downlink. Dropping this without calling [`Self::close`]
/// leaves the view registered — callers that need deterministic teardown
/// must close explicitly, the same tradeoff the connection pool itself
/// makes for its subscriber bookkeeping.
pub struct EventDownlinkView {
    manager: Arc<crate::downlink::DownlinkManager>,
    manager_pool: Arc<ManagerPool>,
    node_uri: String,
    lane_uri: String,
    view_id: u64,
    closed: bool,
}

impl EventDownlinkView {
    pub async fn close(mut self) -> Result<(), WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        self.manager.remove_view(self.view_id).await;
        self.manager_pool.remove_if_empty(&self.node_uri, &self.lane_uri).await;
        self.closed = true;
        Ok(())
    }
}

/// Builder for a value downlink view.
pub struct ValueDownlinkBuilder {
    client: Arc<WarpClient>,
    host_uri: String,
    node_uri: String,
    lane_uri: String,
    keep_linked: bool,
    keep_synced: bool,
    callbacks: ValueCallbacks,
    lifecycle: LifecycleCallbacks,
}

impl ValueDownlinkBuilder {
    pub fn set_host_uri(mut self, uri: impl Into<String>) -> Self {
        self.host_uri = uri.into();
        self
    }
    pub fn set_node_uri(mut self, uri: impl Into<String>) -> Self {
        self.node_uri = uri.into();
        self
    }
    pub fn set_lane_uri(mut self, uri: impl Into<String>) -> Self {
        self.lane_uri = uri.into();
        self
    }
    pub fn keep_synced(mut self, v: bool) -> Self {
        self.keep_synced = v;
        self
    }
    pub fn did_set(mut self, f: impl Fn(&Value, &Value) + Send + Sync + 'static) -> Self {
        self.callbacks.did_set = Some(Box::new(f));
        self
    }
    pub fn did_sync(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.lifecycle.did_sync = Some(Box::new(f));
        self
    }

    pub async fn open(self) -> Result<ValueDownlinkView, WarpError> {
        let (manager, pool) = self
            .client
            .open_manager(&self.host_uri, &self.node_uri, &self.lane_uri, false, self.keep_synced, DownlinkKind::Value)
            .await?;
        let view_id = pool.next_view_id();
        manager.add_view(view_id, self.lifecycle, ViewCallbacks::Value(self.callbacks)).await?;
        Ok(ValueDownlinkView {
            manager,
            manager_pool: pool,
            node_uri: self.node_uri,
            lane_uri: self.lane_uri,
            view_id,
            closed: false,
        })
    }
}

pub struct ValueDownlinkView {
    manager: Arc<crate::downlink::DownlinkManager>,
    manager_pool: Arc<ManagerPool>,
    node_uri: String,
    lane_uri: String,
    view_id: u64,
    closed: bool,
}

impl ValueDownlinkView {
    /// Blocks until at least one `synced` has been observed, then returns
    /// the currently held value.
    pub async fn get(&self) -> Result<Value, WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        Ok(self.manager.get_value().await)
    }

    pub fn set(&self, value: Value) -> Result<(), WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        self.manager.send_command(crate::downlink::value::ValueModel::command_body(value));
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        self.manager.remove_view(self.view_id).await;
        self.manager_pool.remove_if_empty(&self.node_uri, &self.lane_uri).await;
        self.closed = true;
        Ok(())
    }
}

/// Builder for a map downlink view.
pub struct MapDownlinkBuilder {
    client: Arc<WarpClient>,
    host_uri: String,
    node_uri: String,
    lane_uri: String,
    keep_linked: bool,
    keep_synced: bool,
    callbacks: MapCallbacks,
    lifecycle: LifecycleCallbacks,
}

impl MapDownlinkBuilder {
    pub fn set_host_uri(mut self, uri: impl Into<String>) -> Self {
        self.host_uri = uri.into();
        self
    }
    pub fn set_node_uri(mut self, uri: impl Into<String>) -> Self {
        self.node_uri = uri.into();
        self
    }
    pub fn set_lane_uri(mut self, uri: impl Into<String>) -> Self {
        self.lane_uri = uri.into();
        self
    }
    pub fn keep_synced(mut self, v: bool) -> Self {
        self.keep_synced = v;
        self
    }
    pub fn did_update(mut self, f: impl Fn(&Value, &Value, Option<&Value>) + Send + Sync + 'static) -> Self {
        self.callbacks.did_update = Some(Box::new(f));
        self
    }
    pub fn did_remove(mut self, f: impl Fn(&Value, &Value) + Send + Sync + 'static) -> Self {
        self.callbacks.did_remove = Some(Box::new(f));
        self
    }

    pub async fn open(self) -> Result<MapDownlinkView, WarpError> {
        let (manager, pool) = self
            .client
            .open_manager(&self.host_uri, &self.node_uri, &self.lane_uri, false, self.keep_synced, DownlinkKind::Map)
            .await?;
        let view_id = pool.next_view_id();
        manager.add_view(view_id, self.lifecycle, ViewCallbacks::Map(self.callbacks)).await?;
        Ok(MapDownlinkView {
            manager,
            manager_pool: pool,
            node_uri: self.node_uri,
            lane_uri: self.lane_uri,
            view_id,
            closed: false,
        })
    }
}

pub struct MapDownlinkView {
    manager: Arc<crate::downlink::DownlinkManager>,
    manager_pool: Arc<ManagerPool>,
    node_uri: String,
    lane_uri: String,
    view_id: u64,
    closed: bool,
}

impl MapDownlinkView {
    pub async fn get(&self, key: Value) -> Result<Option<Value>, WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        Ok(self.manager.get_map_entry(&key).await)
    }

    pub async fn get_all(&self) -> Result<Vec<(Value, Value)>, WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        Ok(self.manager.get_map_all().await)
    }

    pub fn update(&self, key: Value, value: Value) -> Result<(), WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        self.manager.send_command(crate::downlink::map::MapModel::command_update(key, value));
        Ok(())
    }

    pub fn remove(&self, key: Value) -> Result<(), WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        self.manager.send_command(crate::downlink::map::MapModel::command_remove(key));
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), WarpError> {
        if self.closed {
            return Err(WarpError::ViewClosed);
        }
        self.manager.remove_view(self.view_id).await;
        self.manager_pool.remove_if_empty(&self.node_uri, &self.lane_uri).await;
        self.closed = true;
        Ok(())
    }
}
