//! Order-book delta sequence consistency.
//!
//! Every snapshot and delta carries an update id `u`; deltas also carry
//! `pu`, the id of the update they follow. The stream is gapless between
//! two observations when a delta's `pu` equals a `u` already seen. The check
//! is a liveness sample: one matching transition inside the budget is
//! enough, it does not prove every delta is gapless.

use super::classify::{payload_channel, unwrap_payload};
use super::wait::{wait_first_data, wait_subscribe_ack};
use crate::cex::cryptocom::GENERIC_BOOK_CHANNEL;
use crate::common::{BookSession, ConformanceError, MessageSource};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on a single receive inside [find_consistent_delta].
pub const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Update-id cursor owned by one consistency attempt. Remembers every `u`
/// it has observed, including the starting one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCursor {
    last_u: Option<u64>,
    seen: HashSet<u64>,
}

impl UpdateCursor {
    pub fn new(last_u: Option<u64>) -> Self {
        Self {
            last_u,
            seen: last_u.into_iter().collect(),
        }
    }

    /// Most recent `u` observed.
    pub fn last_u(&self) -> Option<u64> {
        self.last_u
    }

    /// Feeds one data item. Returns true when its `pu` points at an update
    /// this cursor has already observed; otherwise advances the cursor to
    /// the item's `u`, if it has one.
    pub fn observe(&mut self, item: &Value) -> bool {
        if let Some(pu) = item.get("pu").and_then(Value::as_u64) {
            if self.seen.contains(&pu) {
                return true;
            }
        }
        if let Some(u) = item.get("u").and_then(Value::as_u64) {
            self.last_u = Some(u);
            self.seen.insert(u);
        }
        false
    }
}

/// `u` of the first data item that carries one.
pub fn cursor_from_payload(payload: &Value) -> Option<u64> {
    payload
        .get("data")
        .and_then(Value::as_array)?
        .iter()
        .find_map(|item| item.get("u").and_then(Value::as_u64))
}

/// Watches `ws` for up to `max_wait` for a delta whose `pu` equals a `u`
/// already observed on `channels` (or the generic `book` channel), starting
/// from `last_u`.
///
/// Returns `Ok(false)` when the budget runs out without a match. Receive
/// timeouts only retry; other receive errors propagate.
pub async fn find_consistent_delta<S>(
    ws: &mut S,
    channels: &[String],
    last_u: Option<u64>,
    max_wait: Duration,
) -> Result<bool, ConformanceError>
where
    S: MessageSource + ?Sized,
{
    // a budget past the clock's range means no deadline
    let deadline = Instant::now().checked_add(max_wait);
    let mut cursor = UpdateCursor::new(last_u);

    loop {
        let recv_timeout = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(false);
                }
                RECV_TIMEOUT.min(deadline - now)
            }
            None => RECV_TIMEOUT,
        };

        let msg = match ws.recv(recv_timeout).await {
            Ok(msg) => msg,
            Err(e) if e.is_timeout() => continue,
            Err(e) => return Err(e),
        };

        let payload = unwrap_payload(&msg);
        let channel = payload_channel(payload);
        let accepted = channel == Some(GENERIC_BOOK_CHANNEL)
            || channels.iter().any(|ch| channel == Some(ch.as_str()));
        if !accepted {
            continue;
        }

        let Some(items) = payload.get("data").and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            if cursor.observe(item) {
                tracing::debug!(pu = ?item.get("pu"), "consistent delta found");
                return Ok(true);
            }
        }
    }
}

/// Result of [check_delta_sequence].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// A gapless transition was seen in the given 1-based round.
    Consistent { round: u32 },
    /// No round saw one. Quiet or throttled markets look the same as a
    /// broken stream, so this is not reported as a failure.
    Inconclusive { rounds: u32 },
}

#[derive(Debug, Clone)]
pub struct DeltaCheckConfig {
    pub channel: String,
    /// Extra subscribe params (`book_subscription_type`, `book_update_frequency`).
    pub extra_params: Map<String, Value>,
    pub round_budget: Duration,
    pub ack_timeout: Duration,
    pub first_data_timeout: Duration,
    /// Total rounds including the first; a fresh subscription precedes each retry.
    pub max_rounds: u32,
}

impl DeltaCheckConfig {
    pub fn new(channel: impl Into<String>, extra_params: Map<String, Value>) -> Self {
        Self {
            channel: channel.into(),
            extra_params,
            round_budget: Duration::from_secs(25),
            ack_timeout: Duration::from_secs(10),
            first_data_timeout: Duration::from_secs(15),
            max_rounds: 2,
        }
    }
}

/// Subscribe, take the cursor from the first snapshot, then look for a
/// consistent delta. Between rounds the channel is unsubscribed, ignoring
/// failures, and subscribed again.
pub async fn check_delta_sequence<S>(
    ws: &mut S,
    config: &DeltaCheckConfig,
) -> Result<SequenceOutcome, ConformanceError>
where
    S: BookSession + ?Sized,
{
    let rounds = config.max_rounds.max(1);
    for round in 1..=rounds {
        if round > 1 {
            if let Err(e) = ws.unsubscribe(std::slice::from_ref(&config.channel)).await {
                tracing::debug!(round, "unsubscribe before retry failed: {}", e);
            }
        }
        if run_round(ws, config, round).await? {
            return Ok(SequenceOutcome::Consistent { round });
        }
    }
    Ok(SequenceOutcome::Inconclusive { rounds })
}

async fn run_round<S>(
    ws: &mut S,
    config: &DeltaCheckConfig,
    round: u32,
) -> Result<bool, ConformanceError>
where
    S: BookSession + ?Sized,
{
    let channels = std::slice::from_ref(&config.channel);
    let req_id = ws.subscribe(channels, Some(&config.extra_params)).await?;
    wait_subscribe_ack(ws, req_id, &config.channel, config.ack_timeout).await?;

    let payload = wait_first_data(ws, &config.channel, config.first_data_timeout).await?;
    let Some(last_u) = cursor_from_payload(&payload) else {
        tracing::info!("[delta][round={}] first snapshot has no 'u': {}", round, payload);
        return Ok(false);
    };

    let found = find_consistent_delta(ws, channels, Some(last_u), config.round_budget).await?;
    if !found {
        tracing::info!(
            "[delta][round={}] did not see a delta with pu on an observed u within {:?}",
            round,
            config.round_budget
        );
    }
    Ok(found)
}
