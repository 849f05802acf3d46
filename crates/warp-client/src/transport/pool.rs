// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-keyed cache of [`WsConnection`]s shared by every downlink view
//! that talks to the same host.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::transport::connection::{ConnectionStatus, EnvelopeSink, WsConnection};
use crate::transport::retry::RetryStrategy;
use crate::warp::uri::normalize_host_uri;

/// Keeps at most one [`WsConnection`] per normalized host URI. A closed
/// connection is evicted, not reused — the next request for that host
/// builds a fresh one with a reset retry state.
pub struct ConnectionPool {
    connections: RwLock<HashMap<String, Arc<WsConnection>>>,
    default_retry_strategy: RetryStrategy,
}

impl ConnectionPool {
    pub fn new(default_retry_strategy: RetryStrategy) -> Self {
        ConnectionPool { connections: RwLock::new(HashMap::new()), default_retry_strategy }
    }

    /// Returns the existing connection for `host_uri` if it isn't closed,
    /// otherwise constructs and caches a new one. Does not open the socket
    /// — that happens lazily on the first subscriber.
    pub async fn get_connection(
        &self,
        host_uri: &str,
        sink: Arc<dyn EnvelopeSink>,
    ) -> Result<Arc<WsConnection>, crate::error::WarpError> {
        let normalized = normalize_host_uri(host_uri)?;
        {
            let connections = self.connections.read().await;
            if let Some(conn) = connections.get(&normalized) {
                if conn.status() != ConnectionStatus::Closed {
                    return Ok(Arc::clone(conn));
                }
            }
        }
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.get(&normalized) {
            if conn.status() != ConnectionStatus::Closed {
                return Ok(Arc::clone(conn));
            }
        }
        let conn = WsConnection::new(normalized.clone(), sink, self.default_retry_strategy.clone());
        connections.insert(normalized, Arc::clone(&conn));
        Ok(conn)
    }

    pub async fn remove_connection(&self, host_uri: &str) {
        if let Ok(normalized) = normalize_host_uri(host_uri) {
            self.connections.write().await.remove(&normalized);
        }
    }

    /// Subscribes to the connection for `host_uri`, folding in this
    /// subscriber's persistence flags, and evicts the connection from the
    /// pool if this call leaves it with zero subscribers (possible when a
    /// caller subscribes and immediately unsubscribes under contention).
    pub async fn add_subscriber(
        &self,
        host_uri: &str,
        sink: Arc<dyn EnvelopeSink>,
        keep_linked: bool,
        keep_synced: bool,
    ) -> Result<Arc<WsConnection>, crate::error::WarpError> {
        let conn = self.get_connection(host_uri, sink).await?;
        conn.subscribe(keep_linked, keep_synced);
        Ok(conn)
    }

    pub async fn remove_subscriber(&self, host_uri: &str) {
        let normalized = match normalize_host_uri(host_uri) {
            Ok(n) => n,
            Err(_) => return,
        };
        let should_remove = {
            let connections = self.connections.read().await;
            match connections.get(&normalized) {
                Some(conn) => conn.unsubscribe(),
                None => false,
            }
        };
        if should_remove {
            self.connections.write().await.remove(&normalized);
        }
    }
}
