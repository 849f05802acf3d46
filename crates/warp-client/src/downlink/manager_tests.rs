// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::{Arc, Mutex};

use super::manager::{DownlinkKind, LifecycleCallbacks, ManagerPool, ViewCallbacks};
use crate::downlink::value::ValueCallbacks;
use crate::transport::connection::EnvelopeSink;
use crate::transport::{RetryStrategy, WsConnection};
use crate::value::Value;
use crate::warp::Envelope;

struct NullSink;
impl EnvelopeSink for NullSink {
    fn route_envelope(&self, _env: Envelope) {}
}

fn test_connection() -> Arc<WsConnection> {
    WsConnection::new("ws://localhost:0", Arc::new(NullSink), RetryStrategy::None)
}

#[tokio::test]
async fn kind_mismatch_is_rejected() {
    let pool = ManagerPool::new();
    let conn = test_connection();
    pool.get_or_create("/room/1", "users", Arc::clone(&conn), DownlinkKind::Value).await.expect("first open");
    let result = pool.get_or_create("/room/1", "users", conn, DownlinkKind::Event).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn two_value_views_share_one_sync_and_both_see_did_set() {
    let pool = ManagerPool::new();
    let conn = test_connection();
    let manager = pool.get_or_create("/room/1", "users", conn, DownlinkKind::Value).await.expect("open manager");

    let seen_a: Arc<Mutex<Vec<(Value, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_b: Arc<Mutex<Vec<(Value, Value)>>> = Arc::new(Mutex::new(Vec::new()));

    for seen in [Arc::clone(&seen_a), Arc::clone(&seen_b)] {
        let view_id = pool.next_view_id();
        let mut callbacks = ValueCallbacks::default();
        callbacks.did_set = Some(Box::new(move |new, old| {
            seen.lock().expect("lock").push((new.clone(), old.clone()));
        }));
        manager
            .add_view(view_id, LifecycleCallbacks::default(), ViewCallbacks::Value(callbacks))
            .await
            .expect("add view");
    }

    manager.receive_message(Envelope::sync("/room/1", "users")).await; // no-op, not a response envelope
    manager.receive_message(Envelope::command("/room/1", "users", Value::Absent)).await; // no-op

    let event = Envelope::Event(crate::warp::LaneAddressed {
        node_uri: "/room/1".into(),
        lane_uri: "users".into(),
        prio: None,
        rate: None,
        body: Value::int(42),
    });
    manager.receive_message(event).await;

    assert_eq!(seen_a.lock().expect("lock").as_slice(), &[(Value::int(42), Value::Absent)]);
    assert_eq!(seen_b.lock().expect("lock").as_slice(), &[(Value::int(42), Value::Absent)]);
}

#[tokio::test]
async fn did_sync_never_fires_before_did_link() {
    let pool = ManagerPool::new();
    let conn = test_connection();
    let manager = pool.get_or_create("/room/1", "users", conn, DownlinkKind::Value).await.expect("open manager");

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let order_link = Arc::clone(&order);
    let order_sync = Arc::clone(&order);
    let mut lifecycle = LifecycleCallbacks::default();
    lifecycle.did_link = Some(Box::new(move || order_link.lock().expect("lock").push("link")));
    lifecycle.did_sync = Some(Box::new(move || order_sync.lock().expect("lock").push("sync")));

    let view_id = pool.next_view_id();
    manager.add_view(view_id, lifecycle, ViewCallbacks::Value(ValueCallbacks::default())).await.expect("add view");

    manager.receive_message(Envelope::Linked(lane("/room/1", "users"))).await;
    manager.receive_message(Envelope::Synced(lane("/room/1", "users"))).await;

    assert_eq!(order.lock().expect("lock").as_slice(), &["link", "sync"]);
}

fn lane(node: &str, lane: &str) -> crate::warp::LaneAddressed {
    crate::warp::LaneAddressed {
        node_uri: node.into(),
        lane_uri: lane.into(),
        prio: None,
        rate: None,
        body: Value::Absent,
    }
}
