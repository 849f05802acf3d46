// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::envelope::Envelope;
use crate::value::Value;

// ── parsing ──

#[test]
fn parse_linked_envelope() {
    let env = Envelope::parse_recon("@linked(node:\"/room/1\",lane:users)");
    match env {
        Envelope::Linked(l) => {
            assert_eq!(l.node_uri, "/room/1");
            assert_eq!(l.lane_uri, "users");
        }
        other => panic!("unexpected envelope: {other:?}"),
    }
}

#[test]
fn parse_event_envelope_with_body() {
    let env = Envelope::parse_recon("@event(node:\"/room/1\",lane:chat)\"hello\"");
    match env {
        Envelope::Event(l) => {
            assert_eq!(l.body, Value::text("hello"));
            assert_eq!(l.route(), "/room/1/chat");
        }
        other => panic!("unexpected envelope: {other:?}"),
    }
}

#[test]
fn parse_authed_envelope_has_no_route() {
    let env = Envelope::parse_recon("@authed");
    assert!(env.route().is_none());
    assert!(matches!(env, Envelope::Authed(_)));
}

#[test]
fn parse_unknown_tag_falls_back_to_unknown() {
    let env = Envelope::parse_recon("@frobnicate(node:a,lane:b)");
    assert!(matches!(env, Envelope::Unknown(_)));
}

#[test]
fn lane_envelope_missing_headers_falls_back_to_unknown() {
    let env = Envelope::parse_recon("@link(lane:users)");
    assert!(matches!(env, Envelope::Unknown(_)));
}

// ── writing ──

#[test]
fn sync_envelope_round_trips() {
    let env = Envelope::sync("/room/1", "users");
    let text = env.to_recon();
    let parsed = Envelope::parse_recon(&text);
    assert_eq!(env, parsed);
}

#[test]
fn command_envelope_carries_body() {
    let env = Envelope::command("/room/1", "users", Value::int(7));
    let text = env.to_recon();
    assert!(text.starts_with("@command("));
    let parsed = Envelope::parse_recon(&text);
    match parsed {
        Envelope::Command(l) => assert_eq!(l.body, Value::int(7)),
        other => panic!("unexpected envelope: {other:?}"),
    }
}
