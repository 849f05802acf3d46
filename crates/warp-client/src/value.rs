// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Recon value model: the algebraic structured value that every parsed
//! message and every outbound envelope is built from.

use std::fmt;
use std::sync::Arc;

/// Bits tracked on a [`Record`]'s backing storage.
///
/// `IMMUTABLE` marks storage the parser handed out that must be copied
/// before any in-place mutation; `ALIASED` marks storage shared by more
/// than one `Record` handle (set on clone, cleared on copy-on-write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RecordFlags(u8);

impl RecordFlags {
    const IMMUTABLE: u8 = 0b01;
    const ALIASED: u8 = 0b10;

    fn empty() -> Self {
        RecordFlags(0)
    }

    fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    fn insert(&mut self, bit: u8) {
        self.0 |= bit;
    }
}

/// A single node in the Recon value tree.
///
/// `Extant` and `Absent` are process-wide singletons compared by variant
/// identity, not by any payload — there is none to compare.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Record(Record),
    Text(Arc<str>),
    Num(Num),
    Bool(bool),
    Extant,
    Absent,
}

/// The numeric payload of a [`Value::Num`]. Kept as a distinct enum rather
/// than folding straight to `f64` so integral literals round-trip through
/// the writer without growing a decimal point they never had.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(i) => write!(f, "{i}"),
            Num::Float(v) => write!(f, "{v}"),
        }
    }
}

/// An item held by a [`Record`]: either a bare value or a header field.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),
    Field(Field),
}

/// A header field: an `Attr` (`@key` / `@key(value)`) or a `Slot` (`key:value`).
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Attr(Arc<str>, Value),
    Slot(Value, Value),
}

/// The only container type in the value model. Holds an ordered run of
/// [`Item`]s plus a cached count of how many of them are [`Field`]s, so
/// callers can tell "plain value sequence" from "has headers" in O(1).
#[derive(Debug, Clone)]
pub struct Record {
    items: Arc<Vec<Item>>,
    flags: RecordFlags,
    field_count: usize,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        // Flags are storage bookkeeping, not value identity.
        self.items == other.items
    }
}

impl Record {
    pub fn empty() -> Self {
        Record { items: Arc::new(Vec::new()), flags: RecordFlags::empty(), field_count: 0 }
    }

    pub fn of(items: Vec<Item>) -> Self {
        let field_count = items.iter().filter(|i| matches!(i, Item::Field(_))).count();
        Record { items: Arc::new(items), flags: RecordFlags::empty(), field_count }
    }

    /// Marks this record immutable: parser output handed to user code must
    /// go through this so a later mutation copies rather than clobbers
    /// storage another reader may still be looking at.
    pub fn into_immutable(mut self) -> Self {
        self.flags.insert(RecordFlags::IMMUTABLE);
        self
    }

    pub fn is_immutable(&self) -> bool {
        self.flags.contains(RecordFlags::IMMUTABLE)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Appends an item, copying the backing storage first if it is shared
    /// (`ALIASED`) or came from the parser (`IMMUTABLE`).
    pub fn append(&mut self, item: Item) {
        let is_field = matches!(item, Item::Field(_));
        if self.flags.contains(RecordFlags::IMMUTABLE) || self.flags.contains(RecordFlags::ALIASED) {
            let mut copy = (*self.items).clone();
            copy.push(item);
            self.items = Arc::new(copy);
            self.flags = RecordFlags::empty();
        } else {
            Arc::make_mut(&mut self.items).push(item);
        }
        if is_field {
            self.field_count += 1;
        }
    }

    pub fn view(&self) -> RecordMapView {
        RecordMapView { items: Arc::clone(&self.items), start: 0, end: self.items.len() }
    }
}

/// A windowed, copy-free slice over a [`Record`]'s backing storage.
///
/// Mirrors the original implementation's split between a full `RecordMap`
/// and a `RecordMapView` restricted to `[start, end)`; used by the map
/// downlink to hand out a read-only view of "everything after the header
/// attrs" without allocating.
#[derive(Debug, Clone)]
pub struct RecordMapView {
    items: Arc<Vec<Item>>,
    start: usize,
    end: usize,
}

impl RecordMapView {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        if index >= self.len() {
            return None;
        }
        self.items.get(self.start + index)
    }

    pub fn slice(&self, start: usize, end: usize) -> RecordMapView {
        let start = self.start + start.min(self.len());
        let end = (self.start + end).clamp(start, self.end);
        RecordMapView { items: Arc::clone(&self.items), start, end }
    }

    pub fn to_vec(&self) -> Vec<Item> {
        self.items[self.start..self.end].to_vec()
    }
}

impl Value {
    pub fn text(s: impl Into<Arc<str>>) -> Self {
        Value::Text(s.into())
    }

    pub fn int(v: i64) -> Self {
        Value::Num(Num::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Value::Num(Num::Float(v))
    }

    pub fn is_extant(&self) -> bool {
        matches!(self, Value::Extant)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Size per the original's notion of "number of items": 0 for scalars
    /// and singletons, item count for a record.
    pub fn size(&self) -> usize {
        match self {
            Value::Record(r) => r.len(),
            _ => 0,
        }
    }

    /// The leading attribute's key, if this value is (or reduces to) a
    /// record whose first item is an `Attr`. Used by the envelope codec to
    /// pick a tag before attempting a typed parse.
    pub fn leading_attr(&self) -> Option<(&str, &Value)> {
        let record = self.as_record()?;
        match record.get(0)? {
            Item::Field(Field::Attr(key, value)) => Some((key, value)),
            _ => None,
        }
    }
}

impl From<Field> for Item {
    fn from(f: Field) -> Self {
        Item::Field(f)
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Item::Value(v)
    }
}
