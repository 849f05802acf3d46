// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box test of a value downlink against a real (in-process)
//! WebSocket server: no mocking of the transport layer, matching how the
//! rest of this codebase tests its WebSocket handling.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use warp_client::client::{RetryConfig, WarpClient};
use warp_client::value::Value;
use warp_client::warp::Envelope;

#[tokio::test]
async fn value_downlink_receives_synced_event() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("accept_async");

        // Wait for the client's `sync` request before replying, mirroring
        // the real server's request/response ordering.
        let _ = ws.next().await;

        ws.send(Message::Text(Envelope::Linked(lane()).to_recon().into())).await.expect("send linked");
        ws.send(Message::Text(Envelope::Synced(lane()).to_recon().into())).await.expect("send synced");
        ws.send(Message::Text(
            Envelope::Event(warp_client::warp::LaneAddressed {
                node_uri: "/room/1".into(),
                lane_uri: "users".into(),
                prio: None,
                rate: None,
                body: Value::int(7),
            })
            .to_recon()
            .into(),
        ))
        .await
        .expect("send event");

        // Keep the socket open until the client is done with it.
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let client = WarpClient::new(RetryConfig::default());
    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    let view = client
        .open_value_downlink()
        .set_host_uri(format!("ws://{addr}"))
        .set_node_uri("/room/1")
        .set_lane_uri("users")
        .keep_synced(true)
        .did_set(move |new, _old| seen_clone.lock().expect("lock").push(new.clone()))
        .open()
        .await
        .expect("open value downlink");

    let value = tokio::time::timeout(Duration::from_secs(2), view.get()).await.expect("timed out").expect("get");
    assert_eq!(value, Value::int(7));
    assert_eq!(seen.lock().expect("lock").as_slice(), &[Value::int(7)]);

    view.close().await.expect("close");
    server.await.expect("server task");
}

fn lane() -> warp_client::warp::LaneAddressed {
    warp_client::warp::LaneAddressed {
        node_uri: "/room/1".into(),
        lane_uri: "users".into(),
        prio: None,
        rate: None,
        body: Value::Absent,
    }
}
