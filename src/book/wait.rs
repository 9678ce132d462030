use super::classify::{
    assert_subscribe_ack, is_book_channel, payload_channel, payload_data, unwrap_payload,
};
use crate::common::{ConformanceError, MessageSource};
use serde_json::Value;
use std::time::Duration;

/// Drains messages until the subscribe ack for `req_id` arrives, then
/// validates it. Unrelated messages are discarded. A receive timeout
/// surfaces as [ConformanceError::AckTimeout].
pub async fn wait_subscribe_ack<S>(
    ws: &mut S,
    req_id: u64,
    expected_channel: &str,
    timeout: Duration,
) -> Result<(), ConformanceError>
where
    S: MessageSource + ?Sized,
{
    loop {
        let msg = match ws.recv(timeout).await {
            Ok(msg) => msg,
            Err(e) if e.is_timeout() => {
                return Err(ConformanceError::AckTimeout {
                    req_id,
                    channel: expected_channel.to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        let id_matches = msg.get("id").and_then(Value::as_u64) == Some(req_id);
        let is_subscribe = msg.get("method").and_then(Value::as_str) == Some("subscribe");
        if id_matches && is_subscribe {
            tracing::debug!(req_id, channel = expected_channel, "subscribe ack received");
            return assert_subscribe_ack(&msg, expected_channel);
        }
    }
}

/// Returns the first payload with a non-empty `data` list on
/// `expected_channel` (or the generic `book` channel), unwrapped from its
/// `result` envelope. Only the per-receive `timeout` bounds the wait.
pub async fn wait_first_data<S>(
    ws: &mut S,
    expected_channel: &str,
    timeout: Duration,
) -> Result<Value, ConformanceError>
where
    S: MessageSource + ?Sized,
{
    loop {
        let msg = ws.recv(timeout).await?;
        let payload = unwrap_payload(&msg);
        if payload_data(payload).is_none() {
            continue;
        }
        if is_book_channel(payload_channel(payload), expected_channel) {
            return Ok(payload.clone());
        }
    }
}
