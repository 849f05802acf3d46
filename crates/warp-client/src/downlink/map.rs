// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Map downlinks: an ordered keyed map kept in sync with `@update`/
//! `@remove`/`@clear` bodies.

use indexmap::IndexMap;
use tokio::sync::Mutex;

use crate::downlink::model::{DispatchAction, OpenKind};
use crate::recon;
use crate::value::{Field, Item, Value};

/// Keys are compared by their canonical Recon text rather than by deriving
/// `Hash`/`Eq` on [`Value`] itself — `Value::Num` carries an `f64`, which
/// has no total order to hash against. The canonical text is exactly the
/// identity WARP itself uses for map keys on the wire.
fn key_text(key: &Value) -> String {
    recon::write(key)
}

pub struct MapModel {
    entries: Mutex<IndexMap<String, (Value, Value)>>,
}

impl MapModel {
    pub fn new() -> Self {
        MapModel { entries: Mutex::new(IndexMap::new()) }
    }

    pub fn open_kind(&self) -> OpenKind {
        OpenKind::Sync
    }

    /// Applies one event body and returns the resulting dispatch action(s).
    /// A body is expected to carry a single leading `@update`/`@remove`
    /// attr, or the bare `@clear` attr with no further items.
    pub async fn handle_event(&self, body: Value) -> Vec<DispatchAction> {
        let record = match body.as_record() {
            Some(r) => r,
            None => return Vec::new(),
        };
        let Some(Item::Field(Field::Attr(tag, header))) = record.get(0) else {
            return Vec::new();
        };
        match tag.as_ref() {
            "update" => {
                let Some(key) = header.as_record().and_then(|r| slot_value(r, "key")) else {
                    return Vec::new();
                };
                let new = record.get(1).map(item_to_value).unwrap_or(Value::Absent);
                let mut entries = self.entries.lock().await;
                let old = entries.insert(key_text(&key), (key.clone(), new.clone())).map(|(_, v)| v);
                vec![DispatchAction::DidUpdate { key, new, old }]
            }
            "remove" => {
                let Some(key) = header.as_record().and_then(|r| slot_value(r, "key")) else {
                    return Vec::new();
                };
                let mut entries = self.entries.lock().await;
                match entries.shift_remove(&key_text(&key)) {
                    Some((_, old)) => vec![DispatchAction::DidRemove { key, old }],
                    None => Vec::new(),
                }
            }
            "clear" => {
                let mut entries = self.entries.lock().await;
                let drained: Vec<_> = entries.drain(..).collect();
                drained
                    .into_iter()
                    .map(|(_, (key, old))| DispatchAction::DidRemove { key, old })
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    pub async fn get(&self, key: &Value) -> Option<Value> {
        self.entries.lock().await.get(&key_text(key)).map(|(_, v)| v.clone())
    }

    pub async fn get_all(&self) -> Vec<(Value, Value)> {
        self.entries.lock().await.values().cloned().collect()
    }

    pub fn command_update(key: Value, value: Value) -> Value {
        use crate::value::Record;
        Value::Record(Record::of(vec![
            Item::Field(Field::Attr(
                "update".into(),
                Value::Record(Record::of(vec![Item::Field(Field::Slot(Value::text("key"), key))])),
            )),
            Item::Value(value),
        ]))
    }

    pub fn command_remove(key: Value) -> Value {
        use crate::value::Record;
        Value::Record(Record::of(vec![Item::Field(Field::Attr(
            "remove".into(),
            Value::Record(Record::of(vec![Item::Field(Field::Slot(Value::text("key"), key))])),
        ))]))
    }
}

impl Default for MapModel {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_value(record: &crate::value::Record, name: &str) -> Option<Value> {
    record.items().iter().find_map(|item| match item {
        Item::Field(Field::Slot(k, v)) if k.as_text() == Some(name) => Some(v.clone()),
        _ => None,
    })
}

fn item_to_value(item: &Item) -> Value {
    match item {
        Item::Value(v) => v.clone(),
        Item::Field(f) => Value::Record(crate::value::Record::of(vec![Item::Field(f.clone())])),
    }
}

/// Callbacks a map downlink view may register.
#[derive(Default)]
pub struct MapCallbacks {
    pub did_update: Option<Box<dyn Fn(&Value, &Value, Option<&Value>) + Send + Sync>>,
    pub did_remove: Option<Box<dyn Fn(&Value, &Value) + Send + Sync>>,
}
