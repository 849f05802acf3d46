// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WARP envelopes: the typed projection of a Recon record with a
//! recognized leading attribute that the wire protocol actually speaks.

use crate::recon;
use crate::value::{Field, Item, Record, Value};
use crate::warp::uri::route;

/// Headers common to every lane-scoped envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneAddressed {
    pub node_uri: String,
    pub lane_uri: String,
    pub prio: Option<f64>,
    pub rate: Option<f64>,
    pub body: Value,
}

impl LaneAddressed {
    pub fn route(&self) -> String {
        route(&self.node_uri, &self.lane_uri)
    }
}

/// A WARP control or data message. Host-scoped variants (`Auth`/`Authed`/
/// `Deauth`/`Deauthed`) have no route and are dispatched at the connection
/// rather than to a downlink manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Link(LaneAddressed),
    Sync(LaneAddressed),
    Unlink(LaneAddressed),
    Linked(LaneAddressed),
    Synced(LaneAddressed),
    Unlinked(LaneAddressed),
    Event(LaneAddressed),
    Command(LaneAddressed),
    Auth(Value),
    Authed(Value),
    Deauth(Value),
    Deauthed(Value),
    /// A record with an attribute tag the codec doesn't recognize. Carried
    /// through rather than dropped so a caller can still act on it at host
    /// scope if it wants to.
    Unknown(Record),
}

impl Envelope {
    pub fn route(&self) -> Option<String> {
        match self {
            Envelope::Link(l)
            | Envelope::Sync(l)
            | Envelope::Unlink(l)
            | Envelope::Linked(l)
            | Envelope::Synced(l)
            | Envelope::Unlinked(l)
            | Envelope::Event(l)
            | Envelope::Command(l) => Some(l.route()),
            _ => None,
        }
    }

    pub fn link(node_uri: impl Into<String>, lane_uri: impl Into<String>) -> Self {
        Envelope::Link(LaneAddressed {
            node_uri: node_uri.into(),
            lane_uri: lane_uri.into(),
            prio: None,
            rate: None,
            body: Value::Absent,
        })
    }

    pub fn sync(node_uri: impl Into<String>, lane_uri: impl Into<String>) -> Self {
        Envelope::Sync(LaneAddressed {
            node_uri: node_uri.into(),
            lane_uri: lane_uri.into(),
            prio: None,
            rate: None,
            body: Value::Absent,
        })
    }

    pub fn unlink(node_uri: impl Into<String>, lane_uri: impl Into<String>) -> Self {
        Envelope::Unlink(LaneAddressed {
            node_uri: node_uri.into(),
            lane_uri: lane_uri.into(),
            prio: None,
            rate: None,
            body: Value::Absent,
        })
    }

    pub fn command(node_uri: impl Into<String>, lane_uri: impl Into<String>, body: Value) -> Self {
        Envelope::Command(LaneAddressed {
            node_uri: node_uri.into(),
            lane_uri: lane_uri.into(),
            prio: None,
            rate: None,
            body,
        })
    }

    /// Parses one Recon-encoded frame into a typed envelope. Unknown tags
    /// and malformed headers degrade to [`Envelope::Unknown`] rather than
    /// failing — the connection keeps running on a frame it can't fully
    /// interpret.
    pub fn parse_recon(text: &str) -> Envelope {
        let value = recon::parse(text);
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Envelope {
        let record = match value {
            Value::Record(r) => r,
            other => Record::of(vec![Item::Value(other)]),
        };
        let Some(Item::Field(Field::Attr(tag, headers))) = record.get(0) else {
            return Envelope::Unknown(record);
        };
        let body = body_after_headers(&record);
        match tag.as_ref() {
            "link" => lane_addressed(headers, body).map(Envelope::Link),
            "sync" => lane_addressed(headers, body).map(Envelope::Sync),
            "unlink" => lane_addressed(headers, body).map(Envelope::Unlink),
            "linked" => lane_addressed(headers, body).map(Envelope::Linked),
            "synced" => lane_addressed(headers, body).map(Envelope::Synced),
            "unlinked" => lane_addressed(headers, body).map(Envelope::Unlinked),
            "event" => lane_addressed(headers, body).map(Envelope::Event),
            "command" => lane_addressed(headers, body).map(Envelope::Command),
            "auth" => Some(Envelope::Auth(body)),
            "authed" => Some(Envelope::Authed(body)),
            "deauth" => Some(Envelope::Deauth(body)),
            "deauthed" => Some(Envelope::Deauthed(body)),
            _ => None,
        }
        .unwrap_or(Envelope::Unknown(record))
    }

    pub fn to_recon(&self) -> String {
        recon::write(&self.to_value())
    }

    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Link(l) => lane_value("link", l),
            Envelope::Sync(l) => lane_value("sync", l),
            Envelope::Unlink(l) => lane_value("unlink", l),
            Envelope::Linked(l) => lane_value("linked", l),
            Envelope::Synced(l) => lane_value("synced", l),
            Envelope::Unlinked(l) => lane_value("unlinked", l),
            Envelope::Event(l) => lane_value("event", l),
            Envelope::Command(l) => lane_value("command", l),
            Envelope::Auth(v) => host_value("auth", v),
            Envelope::Authed(v) => host_value("authed", v),
            Envelope::Deauth(v) => host_value("deauth", v),
            Envelope::Deauthed(v) => host_value("deauthed", v),
            Envelope::Unknown(r) => Value::Record(r.clone()),
        }
    }
}

fn body_after_headers(record: &Record) -> Value {
    let items = record.items();
    if items.len() <= 1 {
        Value::Absent
    } else if items.len() == 2 {
        match &items[1] {
            Item::Value(v) => v.clone(),
            Item::Field(f) => Value::Record(Record::of(vec![Item::Field(f.clone())])),
        }
    } else {
        Value::Record(Record::of(items[1..].to_vec()))
    }
}

fn lane_addressed(headers: &Value, body: Value) -> Option<LaneAddressed> {
    let record = headers.as_record();
    let mut node_uri = None;
    let mut lane_uri = None;
    let mut prio = None;
    let mut rate = None;
    if let Some(record) = record {
        for item in record.items() {
            if let Item::Field(Field::Slot(key, value)) = item {
                match key.as_text() {
                    Some("node") => node_uri = value.as_text().map(str::to_owned),
                    Some("lane") => lane_uri = value.as_text().map(str::to_owned),
                    Some("prio") => prio = as_f64(value),
                    Some("rate") => rate = as_f64(value),
                    _ => {}
                }
            }
        }
    }
    Some(LaneAddressed { node_uri: node_uri?, lane_uri: lane_uri?, prio, rate, body })
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Num(n) => Some(match n {
            crate::value::Num::Int(i) => *i as f64,
            crate::value::Num::Float(f) => *f,
        }),
        _ => None,
    }
}

fn lane_value(tag: &str, l: &LaneAddressed) -> Value {
    let mut header_items = vec![
        Item::Field(Field::Slot(Value::text("node"), Value::text(l.node_uri.clone()))),
        Item::Field(Field::Slot(Value::text("lane"), Value::text(l.lane_uri.clone()))),
    ];
    if let Some(prio) = l.prio {
        header_items.push(Item::Field(Field::Slot(Value::text("prio"), Value::float(prio))));
    }
    if let Some(rate) = l.rate {
        header_items.push(Item::Field(Field::Slot(Value::text("rate"), Value::float(rate))));
    }
    let headers = Value::Record(Record::of(header_items));
    let mut items = vec![Item::Field(Field::Attr(tag.into(), headers))];
    match &l.body {
        Value::Absent => {}
        Value::Record(r) if r.is_empty() => {}
        other => items.push(Item::Value(other.clone())),
    }
    Value::Record(Record::of(items))
}

fn host_value(tag: &str, body: &Value) -> Value {
    let mut items = vec![Item::Field(Field::Attr(tag.into(), Value::Extant))];
    if !matches!(body, Value::Absent) {
        items.push(Item::Value(body.clone()));
    }
    Value::Record(Record::of(items))
}
