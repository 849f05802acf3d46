// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::cursor::is_ident;
use super::parser::parse;
use crate::value::{Field, Item, Num, Value};

// ── idents ──

#[test]
fn ident_requires_letter_or_underscore_start() {
    assert!(is_ident("foo"));
    assert!(is_ident("_foo"));
    assert!(is_ident("foo-bar_1"));
    assert!(!is_ident("1foo"));
    assert!(!is_ident(""));
}

#[test]
fn parse_bare_ident_is_text() {
    assert_eq!(parse("hello"), Value::text("hello"));
}

#[test]
fn parse_true_false_are_bools() {
    assert_eq!(parse("true"), Value::Bool(true));
    assert_eq!(parse("false"), Value::Bool(false));
}

// ── numbers ──

#[test]
fn parse_integer() {
    assert_eq!(parse("42"), Value::Num(Num::Int(42)));
    assert_eq!(parse("-7"), Value::Num(Num::Int(-7)));
}

#[test]
fn parse_tolerates_leading_zeros() {
    assert_eq!(parse("007"), Value::Num(Num::Int(7)));
}

#[test]
fn parse_decimal_with_empty_fraction() {
    // "5." has no digits after the dot; the original parser still
    // produces a float rather than treating the dot as a separator.
    assert_eq!(parse("5."), Value::Num(Num::Float(5.0)));
}

#[test]
fn parse_decimal_with_leading_sign_and_empty_integer() {
    assert_eq!(parse("-.5"), Value::Num(Num::Float(-0.5)));
}

// ── strings ──

#[test]
fn parse_quoted_string() {
    assert_eq!(parse("\"hello world\""), Value::text("hello world"));
}

#[test]
fn parse_string_missing_closing_quote_is_lenient() {
    assert_eq!(parse("\"abc"), Value::text("abc"));
}

#[test]
fn parse_empty_input_is_extant() {
    assert_eq!(parse(""), Value::Extant);
}

// ── records ──

#[test]
fn parse_slot_record() {
    let value = parse("{foo: bar}");
    let record = value.as_record().expect("expected a record");
    assert_eq!(record.len(), 1);
    match record.get(0) {
        Some(Item::Field(Field::Slot(k, v))) => {
            assert_eq!(k, &Value::text("foo"));
            assert_eq!(v, &Value::text("bar"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn parse_attr_with_body() {
    let value = parse("@sync(node: \"/room/1\", lane: users)");
    let (tag, header) = value.leading_attr().expect("expected a leading attr");
    assert_eq!(tag, "sync");
    let header_record = header.as_record().expect("header should be a record");
    assert_eq!(header_record.field_count(), 2);
}

#[test]
fn parse_map_update_body() {
    let value = parse("@update(key: 2){5}");
    let record = value.as_record().expect("expected a record");
    assert_eq!(record.len(), 2);
    let (tag, header) = value.leading_attr().expect("expected leading attr");
    assert_eq!(tag, "update");
    assert!(header.as_record().is_some());
    assert_eq!(record.get(1), Some(&Item::Value(Value::Num(Num::Int(5)))));
}

#[test]
fn parse_bare_attr_no_parens_is_extant_value() {
    let value = parse("@tag");
    let (tag, header) = value.leading_attr().expect("expected attr");
    assert_eq!(tag, "tag");
    assert!(header.is_extant());
}

#[test]
fn parse_nested_record() {
    let value = parse("{a: {b: 1}}");
    let record = value.as_record().expect("outer record");
    match record.get(0) {
        Some(Item::Field(Field::Slot(_, v))) => {
            assert!(v.as_record().is_some());
        }
        other => panic!("unexpected item: {other:?}"),
    }
}
