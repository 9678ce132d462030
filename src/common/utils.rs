// src/common/utils.rs
use crate::common::ConformanceError;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

// Parse a decimal field that the exchange may send either as a string or a number
pub fn parse_decimal(value: &Value, field_name: &str) -> Result<Decimal, ConformanceError> {
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ConformanceError::contract(format!("invalid {} format: {}", field_name, value))
    })
}

// Parse an integer millisecond timestamp sent either as a number or a numeric string
pub fn parse_millis(value: &Value, field_name: &str) -> Result<i64, ConformanceError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ConformanceError::contract(format!("invalid {} format: {}", field_name, value))
    })
}

// get timestamp in milliseconds
pub fn get_timestamp_millis() -> u64 {
    chrono::Utc::now()
        .timestamp_millis()
        .try_into()
        .unwrap_or(0)
}

// Render a JSON value for assertion messages without flooding the output
pub fn truncate_for_log(value: &Value, max_chars: usize) -> String {
    let text = value.to_string();
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
