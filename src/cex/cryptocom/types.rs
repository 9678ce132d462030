use crate::common::{ConformanceError, parse_decimal, parse_millis};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

pub const CANDLE_KEYS: [&str; 6] = ["t", "o", "h", "l", "c", "v"];

// Crypto.com Exchange API request/response types

/// Query string of `public/get-candlestick`. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CandlestickQuery {
    pub instrument_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<i64>,
}

impl CandlestickQuery {
    pub fn new(instrument_name: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            instrument_name: instrument_name.into(),
            timeframe: Some(timeframe.into()),
            ..Self::default()
        }
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn window(mut self, start_ts: i64, end_ts: i64) -> Self {
        self.start_ts = Some(start_ts);
        self.end_ts = Some(end_ts);
        self
    }
}

/// One OHLCV bar. `t` is the open time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candle {
    pub t: i64,
    pub o: Decimal,
    pub h: Decimal,
    pub l: Decimal,
    pub c: Decimal,
    pub v: Decimal,
}

impl Candle {
    /// Decodes a candle object, failing on the first missing or malformed key.
    pub fn from_value(value: &Value) -> Result<Self, ConformanceError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConformanceError::contract(format!("candle is not an object: {}", value)))?;
        for key in CANDLE_KEYS {
            if !obj.contains_key(key) {
                return Err(ConformanceError::contract(format!(
                    "missing key {} in candle: {}",
                    key, value
                )));
            }
        }
        Ok(Self {
            t: parse_millis(&obj["t"], "t")?,
            o: parse_decimal(&obj["o"], "o")?,
            h: parse_decimal(&obj["h"], "h")?,
            l: parse_decimal(&obj["l"], "l")?,
            c: parse_decimal(&obj["c"], "c")?,
            v: parse_decimal(&obj["v"], "v")?,
        })
    }
}

/// Subscribe / unsubscribe request frame.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    pub id: u64,
    pub method: &'static str,
    pub params: Map<String, Value>,
    pub nonce: u64,
}

/// Answer to a server `public/heartbeat`; `id` echoes the heartbeat's id.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatResponse {
    pub id: Value,
    pub method: &'static str,
}
