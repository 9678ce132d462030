//! Stateless predicates over decoded order-book stream messages.

use crate::cex::cryptocom::GENERIC_BOOK_CHANNEL;
use crate::common::ConformanceError;
use serde_json::Value;

/// `[price, size, num_orders]`, all strings: price a (possibly negative)
/// decimal, size an unsigned decimal, num_orders an unsigned integer.
pub fn is_level_tuple(x: &Value) -> bool {
    let Some(items) = x.as_array() else {
        return false;
    };
    if items.len() != 3 {
        return false;
    }
    match (items[0].as_str(), items[1].as_str(), items[2].as_str()) {
        (Some(price), Some(size), Some(num_orders)) => {
            is_decimal_literal(price, true)
                && is_decimal_literal(size, false)
                && is_unsigned_integer(num_orders)
        }
        _ => false,
    }
}

/// `-?\d+(\.\d+)?` when `signed`, `\d+(\.\d+)?` otherwise.
fn is_decimal_literal(s: &str, signed: bool) -> bool {
    let digits = match s.strip_prefix('-') {
        Some(rest) if signed => rest,
        Some(_) => return false,
        None => s,
    };
    match digits.split_once('.') {
        Some((int_part, frac_part)) => is_unsigned_integer(int_part) && is_unsigned_integer(frac_part),
        None => is_unsigned_integer(digits),
    }
}

fn is_unsigned_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Accepts both ack shapes:
/// `{"method":"subscribe","code":0,"channel":"book.X.10"}` and
/// `{"method":"subscribe","code":0,"channel":"book","subscription":"book.X.10"}`.
pub fn assert_subscribe_ack(msg: &Value, expected_channel: &str) -> Result<(), ConformanceError> {
    if msg.get("method").and_then(Value::as_str) != Some("subscribe") {
        return Err(ConformanceError::contract(format!("not subscribe ack: {}", msg)));
    }
    if msg.get("code").and_then(Value::as_i64) != Some(0) {
        return Err(ConformanceError::contract(format!("subscribe failed: {}", msg)));
    }
    let channel = msg.get("channel").and_then(Value::as_str);
    let subscription = msg.get("subscription").and_then(Value::as_str);
    if channel == Some(expected_channel)
        || subscription == Some(expected_channel)
        || channel == Some(GENERIC_BOOK_CHANNEL)
    {
        return Ok(());
    }
    Err(ConformanceError::contract(format!(
        "unexpected ack: ch={:?} sub={:?} expect={}",
        channel, subscription, expected_channel
    )))
}

/// Data frames may wrap their payload in a `result` envelope; anything
/// without a non-empty envelope is its own payload.
pub fn unwrap_payload(msg: &Value) -> &Value {
    match msg.get("result") {
        Some(result) if is_truthy(result) => result,
        _ => msg,
    }
}

pub fn payload_channel(payload: &Value) -> Option<&str> {
    payload.get("channel").and_then(Value::as_str)
}

/// Non-empty `data` list of a payload, if any.
pub fn payload_data(payload: &Value) -> Option<&[Value]> {
    payload
        .get("data")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .map(Vec::as_slice)
}

/// True for the scoped key or the generic `book` alias.
pub fn is_book_channel(channel: Option<&str>, expected_channel: &str) -> bool {
    matches!(channel, Some(ch) if ch == expected_channel || ch == GENERIC_BOOK_CHANNEL)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
