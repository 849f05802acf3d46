// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single host's WebSocket connection: the transport every downlink
//! manager for that host shares, with its own reconnect/backoff loop.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::transport::retry::RetryStrategy;
use crate::warp::Envelope;

/// Connection lifecycle. Mirrors the state machine a single upstream
/// socket walks through from first subscriber to last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Closed,
    Connecting,
    Idle,
    Running,
}

/// Receives envelopes routed off a [`WsConnection`]'s read loop.
///
/// Implemented by the downlink manager pool in production; kept as a trait
/// here so the connection can be exercised in isolation in tests.
pub trait EnvelopeSink: Send + Sync {
    fn route_envelope(&self, env: Envelope);
    fn did_auth(&self, _env: &Envelope) {}
    fn did_deauth(&self, _env: &Envelope) {}
}

struct SubscriberFlags {
    keep_linked: AtomicBool,
    keep_synced: AtomicBool,
    count: AtomicU32,
}

/// One host's shared WebSocket transport.
///
/// `keep_linked`/`keep_synced` are the logical OR of every current
/// subscriber's own flags of the same name; `should_reconnect` consults
/// their OR so the connection stays alive exactly as long as some
/// subscriber still needs persistence.
pub struct WsConnection {
    host_uri: String,
    status_tx: watch::Sender<ConnectionStatus>,
    status_rx: watch::Receiver<ConnectionStatus>,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    subscribers: SubscriberFlags,
    auth_message: Mutex<Option<String>>,
    init_message: Mutex<Option<String>>,
    cancel: CancellationToken,
    sink: Arc<dyn EnvelopeSink>,
    retry_strategy: RetryStrategy,
}

impl WsConnection {
    pub fn new(host_uri: impl Into<String>, sink: Arc<dyn EnvelopeSink>, retry_strategy: RetryStrategy) -> Arc<Self> {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Closed);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Arc::new(WsConnection {
            host_uri: host_uri.into(),
            status_tx,
            status_rx,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            subscribers: SubscriberFlags {
                keep_linked: AtomicBool::new(false),
                keep_synced: AtomicBool::new(false),
                count: AtomicU32::new(0),
            },
            auth_message: Mutex::new(None),
            init_message: Mutex::new(None),
            cancel: CancellationToken::new(),
            sink,
            retry_strategy,
        })
    }

    pub fn host_uri(&self) -> &str {
        &self.host_uri
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn should_reconnect(&self) -> bool {
        self.subscribers.keep_linked.load(Ordering::SeqCst) || self.subscribers.keep_synced.load(Ordering::SeqCst)
    }

    /// Registers a new subscriber, folding its persistence flags into the
    /// connection's own OR, and opens the socket if this is the first one.
    pub fn subscribe(self: &Arc<Self>, keep_linked: bool, keep_synced: bool) {
        if keep_linked {
            self.subscribers.keep_linked.store(true, Ordering::SeqCst);
        }
        if keep_synced {
            self.subscribers.keep_synced.store(true, Ordering::SeqCst);
        }
        let was_zero = self.subscribers.count.fetch_add(1, Ordering::SeqCst) == 0;
        if was_zero && self.status() == ConnectionStatus::Closed {
            self.spawn_run_loop();
        }
    }

    /// Drops a subscriber. Returns `true` if no subscribers remain, in
    /// which case the caller (the connection pool) should remove this
    /// connection from its cache.
    pub fn unsubscribe(&self) -> bool {
        let remaining = self.subscribers.count.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        if remaining == 0 {
            self.cancel.cancel();
            let _ = self.status_tx.send(ConnectionStatus::Closed);
        }
        remaining == 0
    }

    pub async fn set_auth_message(&self, message: Option<String>) {
        *self.auth_message.lock().await = message;
    }

    pub async fn set_init_message(&self, message: Option<String>) {
        *self.init_message.lock().await = message;
    }

    /// Queues an outbound envelope, opening the socket first if needed.
    pub fn send(self: &Arc<Self>, envelope: &Envelope) {
        if self.status() == ConnectionStatus::Closed {
            self.spawn_run_loop();
        }
        let _ = self.outbound_tx.send(envelope.to_recon());
    }

    fn spawn_run_loop(self: &Arc<Self>) {
        let conn = Arc::clone(self);
        tokio::spawn(async move { conn.run_loop().await });
    }

    /// The connection's single background task: connect, replay auth/init,
    /// pump inbound/outbound frames, and reconnect under the retry policy
    /// until `should_reconnect` goes false or the retry budget runs out.
    async fn run_loop(self: Arc<Self>) {
        let mut retry = self.retry_strategy.state();
        let mut outbound_rx = match self.outbound_rx.lock().await.take() {
            Some(rx) => rx,
            None => return,
        };

        loop {
            let _ = self.status_tx.send(ConnectionStatus::Connecting);
            match self.run_connection(&mut outbound_rx, &mut retry).await {
                Ok(()) => {
                    tracing::debug!(host = %self.host_uri, "warp connection closed");
                }
                Err(err) => {
                    tracing::debug!(host = %self.host_uri, error = %err, "warp connection failed");
                }
            }
            if self.cancel.is_cancelled() {
                return;
            }
            if self.should_reconnect() && retry.retry().await {
                continue;
            }
            let _ = self.status_tx.send(ConnectionStatus::Closed);
            return;
        }
    }

    /// Runs a single connection attempt to completion: handshake, auth/init
    /// replay, then the inbound/outbound pump. Returns once the socket
    /// closes (cleanly or via cancellation) or propagates whatever I/O
    /// error ended the attempt, for `run_loop` to log and weigh against the
    /// retry policy.
    async fn run_connection(
        self: &Arc<Self>,
        outbound_rx: &mut mpsc::UnboundedReceiver<String>,
        retry: &mut crate::transport::retry::RetryState,
    ) -> anyhow::Result<()> {
        let (stream, _) = tokio_tungstenite::connect_async(self.host_uri.as_str())
            .await
            .with_context(|| format!("connect to {}", self.host_uri))?;
        retry.reset();

        let _ = self.status_tx.send(ConnectionStatus::Idle);
        let (mut write, mut read) = stream.split();

        if let Some(auth) = self.auth_message.lock().await.clone() {
            write.send(Message::Text(auth.into())).await.context("send auth message")?;
        }
        if let Some(init) = self.init_message.lock().await.clone() {
            write.send(Message::Text(init.into())).await.context("send init message")?;
        }

        let _ = self.status_tx.send(ConnectionStatus::Running);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = write.close().await;
                    return Ok(());
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(text) => write.send(Message::Text(text.into())).await.context("send outbound envelope")?,
                        None => return Ok(()),
                    }
                }
                inbound = read.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => self.dispatch(&text),
                        Some(Ok(Message::Close(_))) | None => return Ok(()),
                        Some(Ok(_)) => {}
                        Some(Err(err)) => return Err(err).context("read from upstream"),
                    }
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let envelope = Envelope::parse_recon(text);
        match &envelope {
            Envelope::Authed(_) => self.sink.did_auth(&envelope),
            Envelope::Deauthed(_) => self.sink.did_deauth(&envelope),
            _ if envelope.route().is_some() => self.sink.route_envelope(envelope),
            _ => {}
        }
    }
}
