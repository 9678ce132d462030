//! Contract checks over decoded `get-candlestick` bodies.
//!
//! Each check returns [ConformanceError::ContractViolation] naming the
//! offending values instead of panicking, so scenarios can report them.

use crate::cex::cryptocom::Candle;
use crate::common::{ConformanceError, parse_millis, truncate_for_log};
use rust_decimal::Decimal;
use serde_json::Value;

const BODY_PREVIEW_CHARS: usize = 500;

/// Unwraps the `result` field, which the API sends either as an object or
/// as a one-element list of objects.
pub fn extract_result(body: &Value) -> Result<&Value, ConformanceError> {
    match body.get("result") {
        Some(Value::Array(items)) => items.first().ok_or_else(|| {
            ConformanceError::contract(format!(
                "empty result list: {}",
                truncate_for_log(body, BODY_PREVIEW_CHARS)
            ))
        }),
        Some(result @ Value::Object(_)) => Ok(result),
        other => Err(ConformanceError::contract(format!(
            "unexpected result type: {}; body={}",
            json_type_name(other),
            truncate_for_log(body, BODY_PREVIEW_CHARS)
        ))),
    }
}

/// The `data` list of an extracted result.
pub fn candle_data(result: &Value) -> Result<&[Value], ConformanceError> {
    result
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            ConformanceError::contract(format!(
                "result has no data list: {}",
                truncate_for_log(result, BODY_PREVIEW_CHARS)
            ))
        })
}

/// Open times must never go backwards.
pub fn assert_sorted_by_t(data: &[Value]) -> Result<(), ConformanceError> {
    let mut previous: Option<i64> = None;
    for (idx, candle) in data.iter().enumerate() {
        let t = candle
            .get("t")
            .ok_or_else(|| ConformanceError::contract(format!("missing key t at index {}", idx)))
            .and_then(|v| parse_millis(v, "t"))?;
        if let Some(prev) = previous {
            if t < prev {
                return Err(ConformanceError::contract(format!(
                    "timestamps not ascending: t[{}]={} < t[{}]={}",
                    idx,
                    t,
                    idx - 1,
                    prev
                )));
            }
        }
        previous = Some(t);
    }
    Ok(())
}

/// Decodes one candle and checks `l <= o <= h`, `l <= c <= h`, `v >= 0`.
pub fn assert_ohlc_ok(candle: &Value) -> Result<Candle, ConformanceError> {
    let bar = Candle::from_value(candle)?;
    if bar.h < bar.l {
        return Err(ConformanceError::contract(format!("h({}) < l({})", bar.h, bar.l)));
    }
    if bar.o < bar.l || bar.o > bar.h {
        return Err(ConformanceError::contract(format!(
            "o({}) not in [{},{}]",
            bar.o, bar.l, bar.h
        )));
    }
    if bar.c < bar.l || bar.c > bar.h {
        return Err(ConformanceError::contract(format!(
            "c({}) not in [{},{}]",
            bar.c, bar.l, bar.h
        )));
    }
    if bar.v < Decimal::ZERO {
        return Err(ConformanceError::contract(format!("v({}) < 0", bar.v)));
    }
    Ok(bar)
}

/// `start_ts - interval_ms <= t <= end_ts`: a bar may open up to one
/// interval before the window because `t` is the bar's open time.
pub fn assert_time_in_window_with_alignment(
    t_ms: i64,
    start_ts: i64,
    end_ts: i64,
    interval_ms: i64,
) -> Result<(), ConformanceError> {
    let lower = start_ts - interval_ms;
    if t_ms < lower || t_ms > end_ts {
        return Err(ConformanceError::contract(format!(
            "t={} out of [{}, {}] (allowing -{}ms alignment)",
            t_ms, start_ts, end_ts, interval_ms
        )));
    }
    Ok(())
}

/// `0 < len <= requested`.
pub fn assert_count_within(len: usize, requested: i64) -> Result<(), ConformanceError> {
    if len == 0 || (len as i64) > requested {
        return Err(ConformanceError::contract(format!(
            "expected 0 < len(data) <= {}, got {}",
            requested, len
        )));
    }
    Ok(())
}

/// Body carries a `result` whose `data` list is empty. The `code` is not
/// consulted: some environments answer 0, others a non-zero code.
pub fn assert_empty_result(body: &Value) -> Result<(), ConformanceError> {
    let data = candle_data(extract_result(body)?)?;
    if !data.is_empty() {
        return Err(ConformanceError::contract(format!(
            "expected empty data, got {} candles",
            data.len()
        )));
    }
    Ok(())
}

fn json_type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
