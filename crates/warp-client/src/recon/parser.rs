// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recursive-descent Recon parser. Never panics and never fails: malformed
//! input is parsed best-effort, consistent with a server that may be
//! streaming a still-in-flight frame.

use crate::recon::cursor::{is_digit, is_ident_char, is_ident_start_char, is_space, Cursor, EOF};
use crate::value::{Field, Item, Num, Record, Value};

/// Parses a complete Recon document into a [`Value`].
///
/// Multiple top-level items (or any item that is a [`Field`]) produce a
/// [`Value::Record`]; a single bare value produces that value directly, so
/// `parse("5")` is `Value::Num` rather than a one-element record.
pub fn parse(text: &str) -> Value {
    let mut cursor = Cursor::new(text);
    let mut builder = Vec::new();
    parse_block(&mut cursor, &mut builder);
    finish(builder)
}

/// Parses into a caller-supplied accumulator, appending after whatever it
/// already holds. Lets higher-level parsers (the envelope codec) build one
/// record out of several parse calls over the same cursor.
pub fn parse_into(cursor: &mut Cursor<'_>, builder: &mut Vec<Item>) {
    parse_block(cursor, builder);
}

fn finish(items: Vec<Item>) -> Value {
    let has_fields = items.iter().any(|i| matches!(i, Item::Field(_)));
    if items.len() == 1 && !has_fields {
        match items.into_iter().next() {
            Some(Item::Value(v)) => v,
            Some(Item::Field(f)) => Value::Record(Record::of(vec![Item::Field(f)])),
            None => Value::Absent,
        }
    } else if items.is_empty() {
        Value::Extant
    } else {
        Value::Record(Record::of(items))
    }
}

fn skip_space(cursor: &mut Cursor<'_>) {
    while is_space(cursor.head()) {
        cursor.step();
    }
}

fn skip_separators(cursor: &mut Cursor<'_>) -> bool {
    let mut any = false;
    loop {
        skip_space(cursor);
        match cursor.head() {
            ',' | ';' | '\n' | '\r' => {
                cursor.step();
                any = true;
            }
            _ => break,
        }
    }
    any
}

fn parse_block(cursor: &mut Cursor<'_>, builder: &mut Vec<Item>) {
    skip_space(cursor);
    loop {
        skip_separators(cursor);
        skip_space(cursor);
        match cursor.head() {
            EOF | '}' | ')' => break,
            _ => {}
        }
        let before = cursor.pos();
        parse_item(cursor, builder);
        if cursor.pos() == before {
            // Nothing recognized at this position; stop rather than spin.
            break;
        }
    }
}

fn parse_item(cursor: &mut Cursor<'_>, builder: &mut Vec<Item>) {
    skip_space(cursor);
    let mut had_attr = false;
    while cursor.head() == '@' {
        had_attr = true;
        parse_attr(cursor, builder);
        skip_space(cursor);
    }
    skip_space(cursor);
    match cursor.head() {
        EOF | ',' | ';' | '\n' | '\r' | '}' | ')' => {
            if !had_attr {
                // Nothing at all here; parse_block's stall guard handles it.
            }
        }
        _ => {
            let value = parse_value(cursor);
            skip_space(cursor);
            if cursor.head() == ':' {
                cursor.step();
                skip_space(cursor);
                let slot_value = if matches!(cursor.head(), EOF | ',' | ';' | '\n' | '\r' | '}' | ')') {
                    Value::Extant
                } else {
                    parse_value(cursor)
                };
                builder.push(Item::Field(Field::Slot(value, slot_value)));
            } else {
                builder.push(Item::Value(value));
            }
        }
    }
}

fn parse_attr(cursor: &mut Cursor<'_>, builder: &mut Vec<Item>) {
    cursor.step(); // consume '@'
    let key = parse_ident_text(cursor);
    skip_space(cursor);
    let value = if cursor.head() == '(' {
        cursor.step();
        let mut inner = Vec::new();
        parse_block(cursor, &mut inner);
        skip_space(cursor);
        if cursor.head() == ')' {
            cursor.step();
        }
        finish(inner)
    } else {
        Value::Extant
    };
    builder.push(Item::Field(Field::Attr(key.into(), value)));
}

fn parse_ident_text(cursor: &mut Cursor<'_>) -> String {
    let mut s = String::new();
    if is_ident_start_char(cursor.head()) {
        s.push(cursor.head());
        cursor.step();
        while is_ident_char(cursor.head()) {
            s.push(cursor.head());
            cursor.step();
        }
    }
    s
}

fn parse_value(cursor: &mut Cursor<'_>) -> Value {
    skip_space(cursor);
    match cursor.head() {
        '{' | '(' => parse_record(cursor),
        '"' => parse_string(cursor),
        c if is_digit(c) || c == '-' => parse_number(cursor),
        c if is_ident_start_char(c) => parse_ident_value(cursor),
        _ => Value::Absent,
    }
}

fn parse_record(cursor: &mut Cursor<'_>) -> Value {
    let closing = if cursor.head() == '{' { '}' } else { ')' };
    cursor.step();
    let mut builder = Vec::new();
    parse_block(cursor, &mut builder);
    skip_space(cursor);
    if cursor.head() == closing {
        cursor.step();
    }
    finish(builder)
}

fn parse_ident_value(cursor: &mut Cursor<'_>) -> Value {
    let ident = parse_ident_text(cursor);
    match ident.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::text(ident),
    }
}

/// Parses a quoted string literal. A missing closing quote is tolerated:
/// whatever was read before end-of-input is returned without error.
fn parse_string(cursor: &mut Cursor<'_>) -> Value {
    cursor.step(); // opening quote
    let mut s = String::new();
    loop {
        match cursor.head() {
            EOF => break,
            '"' => {
                cursor.step();
                break;
            }
            '\\' => {
                cursor.step();
                let escaped = match cursor.head() {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '"' => '"',
                    '\\' => '\\',
                    EOF => break,
                    other => other,
                };
                s.push(escaped);
                cursor.step();
            }
            c => {
                s.push(c);
                cursor.step();
            }
        }
    }
    Value::text(s)
}

/// Parses a number literal. Tolerant of leading zeros; delegates the
/// decimal tail to [`parse_decimal_tail`] which reproduces the original's
/// edge-case handling of an empty fractional part after the dot.
fn parse_number(cursor: &mut Cursor<'_>) -> Value {
    let mut sign = 1i64;
    if cursor.head() == '-' {
        sign = -1;
        cursor.step();
    }
    let mut int_digits = String::new();
    while is_digit(cursor.head()) {
        int_digits.push(cursor.head());
        cursor.step();
    }
    if cursor.head() == '.' {
        cursor.step();
        return parse_decimal_tail(cursor, &int_digits, sign);
    }
    if int_digits.is_empty() {
        return Value::Num(Num::Int(0));
    }
    match int_digits.parse::<i64>() {
        Ok(v) => Value::Num(Num::Int(sign * v)),
        Err(_) => Value::Num(Num::Float(sign as f64 * int_digits.parse::<f64>().unwrap_or(0.0))),
    }
}

/// Handles the tail of a decimal literal after the `.` has been consumed.
///
/// Matches the original decimal parser's behavior exactly for the edge
/// cases its test suite exercises: an empty fractional part yields `.0`
/// (e.g. `"5."` → `5.0`), and a lone `.` with an empty integer part and a
/// negative sign yields `-0.0`.
fn parse_decimal_tail(cursor: &mut Cursor<'_>, int_digits: &str, sign: i64) -> Value {
    let mut frac_digits = String::new();
    while is_digit(cursor.head()) {
        frac_digits.push(cursor.head());
        cursor.step();
    }
    let int_part: f64 = if int_digits.is_empty() { 0.0 } else { int_digits.parse().unwrap_or(0.0) };
    let frac_part: f64 = if frac_digits.is_empty() {
        0.0
    } else {
        format!("0.{frac_digits}").parse().unwrap_or(0.0)
    };
    Value::Num(Num::Float(sign as f64 * (int_part + frac_part)))
}
