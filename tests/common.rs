#![allow(dead_code)]

use async_trait::async_trait;
use market_conformance_rs::{BookSession, ConformanceError, MessageSource};
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted reaction of [ScriptedSession::recv].
pub enum Step {
    /// Subscribe ack for the latest request, with the given `code`.
    Ack(i64),
    Msg(Value),
    /// Nothing arrives; the receive times out.
    Silence,
    Closed,
}

/// In-memory [BookSession]: every subscribe loads the next scripted round.
/// Once a round is drained the session goes quiet, so receives time out.
pub struct ScriptedSession {
    queue: VecDeque<Step>,
    rounds: VecDeque<Vec<Step>>,
    next_id: u64,
    current_id: u64,
    current_channel: String,
    pub subscribed: Vec<(u64, Vec<String>, Option<Map<String, Value>>)>,
    pub unsubscribed: Vec<Vec<String>>,
}

impl ScriptedSession {
    /// A session that is already streaming `steps`.
    pub fn streaming(steps: Vec<Step>) -> Self {
        let mut session = Self::with_rounds(Vec::new());
        session.queue = steps.into();
        session
    }

    pub fn with_rounds(rounds: Vec<Vec<Step>>) -> Self {
        Self {
            queue: VecDeque::new(),
            rounds: rounds.into(),
            next_id: 1000,
            current_id: 0,
            current_channel: String::new(),
            subscribed: Vec::new(),
            unsubscribed: Vec::new(),
        }
    }
}

#[async_trait]
impl MessageSource for ScriptedSession {
    async fn recv(&mut self, timeout: Duration) -> Result<Value, ConformanceError> {
        match self.queue.pop_front() {
            Some(Step::Ack(code)) => Ok(json!({
                "id": self.current_id,
                "method": "subscribe",
                "code": code,
                "channel": self.current_channel,
            })),
            Some(Step::Msg(value)) => Ok(value),
            Some(Step::Closed) => Err(ConformanceError::ConnectionClosed),
            Some(Step::Silence) | None => {
                tokio::time::sleep(timeout).await;
                Err(ConformanceError::Timeout(timeout))
            }
        }
    }
}

#[async_trait]
impl BookSession for ScriptedSession {
    async fn subscribe(
        &mut self,
        channels: &[String],
        extra_params: Option<&Map<String, Value>>,
    ) -> Result<u64, ConformanceError> {
        self.next_id += 1;
        self.current_id = self.next_id;
        self.current_channel = channels.first().cloned().unwrap_or_default();
        self.subscribed
            .push((self.current_id, channels.to_vec(), extra_params.cloned()));
        self.queue = self.rounds.pop_front().unwrap_or_default().into();
        Ok(self.current_id)
    }

    async fn unsubscribe(&mut self, channels: &[String]) -> Result<u64, ConformanceError> {
        self.next_id += 1;
        self.unsubscribed.push(channels.to_vec());
        Ok(self.next_id)
    }
}

/// `{"result": {"channel": ..., "data": [...]}}`
pub fn book_msg(channel: &str, data: Value) -> Step {
    Step::Msg(json!({ "result": { "channel": channel, "data": data } }))
}

pub fn snapshot_item(u: u64) -> Value {
    json!({
        "u": u,
        "t": 1_700_000_000_000i64,
        "bids": [["50000.5", "1.2", "3"]],
        "asks": [["50001.0", "0.8", "1"]],
    })
}
