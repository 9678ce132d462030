use super::classify::{is_level_tuple, payload_data};
use crate::common::ConformanceError;
use serde_json::Value;

pub const SNAPSHOT_KEYS: [&str; 4] = ["u", "t", "bids", "asks"];

/// Checks the first item of a book payload: required keys present, `bids`
/// and `asks` are lists, and their first levels (when present) are valid
/// level tuples. Returns the checked item.
pub fn assert_book_snapshot(payload: &Value) -> Result<&Value, ConformanceError> {
    let data = payload_data(payload).ok_or_else(|| {
        ConformanceError::contract(format!("book payload has no data: {}", payload))
    })?;
    let snap = &data[0];

    for key in SNAPSHOT_KEYS {
        if snap.get(key).is_none() {
            return Err(ConformanceError::contract(format!(
                "missing '{}' in snapshot: {}",
                key, snap
            )));
        }
    }

    for side in ["bids", "asks"] {
        let levels = snap[side].as_array().ok_or_else(|| {
            ConformanceError::contract(format!("'{}' is not a list: {}", side, snap[side]))
        })?;
        if let Some(first) = levels.first() {
            if !is_level_tuple(first) {
                return Err(ConformanceError::contract(format!(
                    "invalid {} level: {}",
                    side, first
                )));
            }
        }
    }

    Ok(snap)
}

/// The answer to a subscription that must be refused. A matching ack must
/// carry `code != 0`; any other message must have `code != 0` or an
/// error-like method (some servers reply with `id = -1`).
pub fn check_subscription_refused(msg: &Value, req_id: u64) -> Result<(), ConformanceError> {
    let code = msg.get("code").and_then(Value::as_i64).unwrap_or(-1);
    let method = msg.get("method").and_then(Value::as_str).unwrap_or("");
    let is_own_ack = msg.get("id").and_then(Value::as_u64) == Some(req_id) && method == "subscribe";

    let refused = if is_own_ack {
        code != 0
    } else {
        code != 0 || method.to_ascii_lowercase().contains("error")
    };
    if refused {
        Ok(())
    } else {
        Err(ConformanceError::contract(format!(
            "expected subscription to fail but it succeeded: {}",
            msg
        )))
    }
}
