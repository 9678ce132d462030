//! Candlestick body assertions, timeframe table and error-outcome classification.

use market_conformance_rs::candlestick::{
    ErrorKind, ErrorOutcome, FALLBACK_INTERVAL_MS, TestData, Timeframe, TimeframeAliases,
    assert_count_within, assert_empty_result, assert_ohlc_ok, assert_sorted_by_t, assert_time_in_window_with_alignment,
    candle_data, classify_error_response, expect_error_outcome, extract_result, interval_ms,
};
use market_conformance_rs::{ApiResponse, CandlestickQuery, ConformanceError};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;

fn ok_response(body: Value) -> Result<ApiResponse, ConformanceError> {
    Ok(ApiResponse { status: 200, body })
}

fn candle(t: i64, o: &str, h: &str, l: &str, c: &str, v: &str) -> Value {
    json!({"t": t, "o": o, "h": h, "l": l, "c": c, "v": v})
}

#[test]
fn test_extract_result_shapes() {
    let listed = json!({"result": [{"data": []}]});
    assert_eq!(extract_result(&listed).unwrap(), &json!({"data": []}));

    let object = json!({"result": {"interval": "M1", "data": []}});
    assert_eq!(extract_result(&object).unwrap()["interval"], json!("M1"));

    assert!(extract_result(&json!({"result": []})).is_err());
    assert!(extract_result(&json!({"result": "x"})).is_err());
    assert!(extract_result(&json!({"code": 0})).is_err());
}

#[test]
fn test_candle_data_requires_list() {
    assert_eq!(candle_data(&json!({"data": [1, 2]})).unwrap().len(), 2);
    assert!(candle_data(&json!({"data": "nope"})).is_err());
    assert!(candle_data(&json!({})).is_err());
}

#[test]
fn test_sorted_by_t() {
    let rising = vec![
        candle(1, "1", "1", "1", "1", "0"),
        candle(1, "1", "1", "1", "1", "0"),
        json!({"t": "3"}),
    ];
    assert!(assert_sorted_by_t(&rising).is_ok());
    assert!(assert_sorted_by_t(&[]).is_ok());

    let falling = vec![json!({"t": 5}), json!({"t": 4})];
    let err = assert_sorted_by_t(&falling).unwrap_err();
    println!("{}", err);
    assert!(err.to_string().contains("t[1]=4"));

    assert!(assert_sorted_by_t(&[json!({"o": "1"})]).is_err());
}

#[test]
fn test_ohlc_bounds() {
    let bar = assert_ohlc_ok(&candle(1, "100.5", "101", "99", "100", "12.25")).unwrap();
    assert_eq!(bar.t, 1);
    assert_eq!(bar.v, Decimal::new(1225, 2));

    // numeric fields are accepted too
    let numeric = json!({"t": 1, "o": 10, "h": 11.5, "l": 9, "c": 10, "v": 0});
    assert!(assert_ohlc_ok(&numeric).is_ok());

    assert!(assert_ohlc_ok(&candle(1, "102", "101", "99", "100", "1")).is_err(), "o > h");
    assert!(assert_ohlc_ok(&candle(1, "100", "101", "99", "98", "1")).is_err(), "c < l");
    assert!(assert_ohlc_ok(&candle(1, "100", "99", "101", "100", "1")).is_err(), "h < l");
    assert!(assert_ohlc_ok(&candle(1, "100", "101", "99", "100", "-1")).is_err(), "v < 0");

    let missing_v = json!({"t": 1, "o": "1", "h": "1", "l": "1", "c": "1"});
    let err = assert_ohlc_ok(&missing_v).unwrap_err();
    assert!(err.to_string().contains("missing key v"));
}

#[test]
fn test_time_window_alignment() {
    let minute = 60_000;
    let (start, end) = (1_000_000, 4_600_000);
    assert!(assert_time_in_window_with_alignment(start, start, end, minute).is_ok());
    assert!(assert_time_in_window_with_alignment(end, start, end, minute).is_ok());
    assert!(assert_time_in_window_with_alignment(start - minute, start, end, minute).is_ok());
    assert!(assert_time_in_window_with_alignment(start - minute - 1, start, end, minute).is_err());
    assert!(assert_time_in_window_with_alignment(end + 1, start, end, minute).is_err());
}

#[test]
fn test_count_within() {
    assert!(assert_count_within(1, 10).is_ok());
    assert!(assert_count_within(10, 10).is_ok());
    assert!(assert_count_within(0, 10).is_err());
    assert!(assert_count_within(11, 10).is_err());
}

#[test]
fn test_timeframe_normalization_is_idempotent() {
    let aliases = TimeframeAliases::default();
    assert_eq!(aliases.normalize("5m"), "M5");
    assert_eq!(aliases.normalize("1D"), "D1");
    assert_eq!(aliases.normalize("X9"), "X9");

    for tf in Timeframe::ALL {
        assert_eq!(aliases.normalize(tf.code()), tf.code());
    }
    for raw in ["1m", "5m", "15m", "1h", "12h", "7D", "14D", "M1", "1M", "X9", ""] {
        let once = aliases.normalize(raw);
        assert_eq!(aliases.normalize(&once), once, "normalizing {:?} twice", raw);
    }
}

#[test]
fn test_alias_chains_rejected() {
    let mut map = BTreeMap::new();
    map.insert("a".to_string(), "b".to_string());
    map.insert("b".to_string(), "M1".to_string());
    assert!(TimeframeAliases::from_map(map).is_err());

    let mut map = BTreeMap::new();
    map.insert("min".to_string(), "M1".to_string());
    map.insert("M1".to_string(), "M1".to_string());
    let aliases = TimeframeAliases::from_map(map).unwrap();
    assert_eq!(aliases.normalize("min"), "M1");
}

#[test]
fn test_interval_table() {
    assert_eq!(interval_ms("M1"), 60_000);
    assert_eq!(interval_ms("M15"), 15 * 60_000);
    assert_eq!(interval_ms("H4"), 4 * 3_600_000);
    assert_eq!(interval_ms("D7"), 7 * 86_400_000);
    assert_eq!(interval_ms("1M"), 30 * 86_400_000);
    assert_eq!(interval_ms("5m"), FALLBACK_INTERVAL_MS, "aliases are not canonical codes");
    assert_eq!(interval_ms("X9"), FALLBACK_INTERVAL_MS);
    assert_eq!("H12".parse::<Timeframe>().unwrap(), Timeframe::H12);
}

#[test]
fn test_classify_error_responses() {
    let hard = classify_error_response(Err(ConformanceError::ApiError {
        status: 400,
        body: "{\"code\":40003,\"message\":\"Invalid request\"}".to_string(),
    }))
    .unwrap();
    assert_eq!(hard.kind(), ErrorKind::HardError);

    let soft = classify_error_response(ok_response(json!({"code": 40004}))).unwrap();
    assert_eq!(soft, ErrorOutcome::SoftNonZero { code: Some(40004) });

    let no_code = classify_error_response(ok_response(json!({"result": {}}))).unwrap();
    assert_eq!(no_code, ErrorOutcome::SoftNonZero { code: None });

    let empty =
        classify_error_response(ok_response(json!({"code": 0, "result": {"data": []}}))).unwrap();
    assert_eq!(empty, ErrorOutcome::SoftEmpty);

    let with_data = ok_response(json!({
        "code": 0,
        "result": {"data": [{"t": 1, "o": "1", "h": "1", "l": "1", "c": "1", "v": "1"}]}
    }));
    assert!(matches!(
        classify_error_response(with_data),
        Err(ConformanceError::ContractViolation(_))
    ));

    let transport = classify_error_response(Err(ConformanceError::ConnectionClosed));
    assert!(matches!(transport, Err(ConformanceError::ConnectionClosed)));
}

#[test]
fn test_expect_error_outcome_membership() {
    let empty = || ok_response(json!({"code": 0, "result": [{"data": []}]}));
    assert!(expect_error_outcome(empty(), &[ErrorKind::SoftEmpty]).is_ok());
    assert!(
        expect_error_outcome(empty(), &[ErrorKind::HardError, ErrorKind::SoftNonZero]).is_err()
    );
}

#[test]
fn test_candlestick_query_omits_unset_fields() {
    let query = CandlestickQuery::new("BTCUSD-PERP", "M5").count(10);
    let encoded = serde_json::to_value(&query).unwrap();
    assert_eq!(
        encoded,
        json!({"instrument_name": "BTCUSD-PERP", "timeframe": "M5", "count": 10})
    );

    let windowed = serde_json::to_value(query.window(1, 2)).unwrap();
    assert_eq!(windowed["start_ts"], json!(1));
    assert_eq!(windowed["end_ts"], json!(2));
}

#[test]
fn test_shipped_test_data_file() {
    let data = TestData::load(Path::new("config/test_data_rest_candlestick.json")).unwrap();
    let defaults = TestData::default();
    assert_eq!(data.valid_cases, defaults.valid_cases);
    assert_eq!(data.negatives, defaults.negatives);
    assert_eq!(data.timeframe_aliases().unwrap(), TimeframeAliases::default());

    let missing = TestData::load(Path::new("config/does-not-exist.json")).unwrap();
    assert_eq!(missing, defaults);
}

#[test]
fn test_empty_result_ignores_code() {
    assert!(assert_empty_result(&json!({"code": 0, "result": {"data": []}})).is_ok());
    assert!(assert_empty_result(&json!({"code": 40004, "result": {"data": []}})).is_ok());
    assert!(assert_empty_result(&json!({"code": 0, "result": [{"data": []}]})).is_ok());

    let with_candle = json!({"code": 0, "result": {"data": [candle(1, "1", "1", "1", "1", "0")]}});
    let err = assert_empty_result(&with_candle).unwrap_err();
    assert!(err.to_string().contains("got 1 candles"), "{}", err);

    assert!(assert_empty_result(&json!({"code": 40004})).is_err(), "no result at all");
}
