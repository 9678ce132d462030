//! Order-book message classifiers and the wait helpers built on them.

mod common;

use common::{ScriptedSession, Step, book_msg, snapshot_item};
use market_conformance_rs::ConformanceError;
use market_conformance_rs::book::{
    assert_book_snapshot, assert_subscribe_ack, check_subscription_refused, is_level_tuple,
    payload_data, unwrap_payload, wait_first_data, wait_subscribe_ack,
};
use serde_json::json;
use std::time::Duration;

const CHANNEL: &str = "book.BTCUSD-PERP.10";

#[test]
fn test_level_tuple() {
    assert!(is_level_tuple(&json!(["50000.5", "1.2", "3"])));
    assert!(is_level_tuple(&json!(["-0.5", "0", "0"])));
    assert!(is_level_tuple(&json!(["50000", "1", "12"])));

    assert!(!is_level_tuple(&json!(["50000.5", "-1.2", "3"])), "negative size");
    assert!(!is_level_tuple(&json!(["abc", "1", "3"])));
    assert!(!is_level_tuple(&json!(["1.", "1", "3"])));
    assert!(!is_level_tuple(&json!(["1", "1", "3.0"])), "num_orders is an integer");
    assert!(!is_level_tuple(&json!([50000.5, "1", "3"])), "price must be a string");
    assert!(!is_level_tuple(&json!(["1", "1"])));
    assert!(!is_level_tuple(&json!("50000.5,1,3")));
}

#[test]
fn test_subscribe_ack_shapes() {
    let direct = json!({"id": 1, "method": "subscribe", "code": 0, "channel": CHANNEL});
    let generic = json!({
        "id": 1, "method": "subscribe", "code": 0,
        "channel": "book", "subscription": CHANNEL,
    });
    assert!(assert_subscribe_ack(&direct, CHANNEL).is_ok());
    assert!(assert_subscribe_ack(&generic, CHANNEL).is_ok());

    let other = json!({"id": 1, "method": "subscribe", "code": 0, "channel": "trade.BTCUSD-PERP"});
    let err = assert_subscribe_ack(&other, CHANNEL).unwrap_err();
    println!("{}", err);
    assert!(matches!(err, ConformanceError::ContractViolation(_)));

    let failed = json!({"id": 1, "method": "subscribe", "code": 10003, "channel": CHANNEL});
    assert!(assert_subscribe_ack(&failed, CHANNEL).is_err());

    let wrong_method = json!({"id": 1, "method": "unsubscribe", "code": 0, "channel": CHANNEL});
    assert!(assert_subscribe_ack(&wrong_method, CHANNEL).is_err());
}

#[test]
fn test_unwrap_payload() {
    let wrapped = json!({"result": {"channel": CHANNEL, "data": [1]}});
    assert_eq!(unwrap_payload(&wrapped), &json!({"channel": CHANNEL, "data": [1]}));

    let bare = json!({"channel": CHANNEL, "data": [1]});
    assert_eq!(unwrap_payload(&bare), &bare);

    // an empty envelope is not a payload
    let empty = json!({"result": {}, "channel": CHANNEL});
    assert_eq!(unwrap_payload(&empty), &empty);

    assert!(payload_data(&json!({"data": []})).is_none());
    assert_eq!(payload_data(&json!({"data": [1, 2]})).map(|d| d.len()), Some(2));
}

#[test]
fn test_book_snapshot_shape() {
    let payload = json!({"channel": CHANNEL, "data": [snapshot_item(42)]});
    let snap = assert_book_snapshot(&payload).expect("valid snapshot");
    assert_eq!(snap["u"], json!(42));

    let empty_sides = json!({"data": [{"u": 1, "t": 1, "bids": [], "asks": []}]});
    assert!(assert_book_snapshot(&empty_sides).is_ok());

    let missing_u = json!({"data": [{"t": 1, "bids": [], "asks": []}]});
    assert!(assert_book_snapshot(&missing_u).is_err());

    let bad_level = json!({"data": [{"u": 1, "t": 1, "bids": [["x", "1", "1"]], "asks": []}]});
    assert!(assert_book_snapshot(&bad_level).is_err());

    let bids_not_list = json!({"data": [{"u": 1, "t": 1, "bids": {}, "asks": []}]});
    assert!(assert_book_snapshot(&bids_not_list).is_err());

    assert!(assert_book_snapshot(&json!({"data": []})).is_err());
}

#[test]
fn test_subscription_refused() {
    let refused_ack = json!({"id": 7, "method": "subscribe", "code": 10004, "channel": "book"});
    assert!(check_subscription_refused(&refused_ack, 7).is_ok());

    let accepted_ack = json!({"id": 7, "method": "subscribe", "code": 0, "channel": "book"});
    assert!(check_subscription_refused(&accepted_ack, 7).is_err());

    // servers sometimes answer with id -1
    let orphan_error = json!({"id": -1, "method": "subscribe", "code": 10004});
    assert!(check_subscription_refused(&orphan_error, 7).is_ok());

    let error_method = json!({"id": -1, "method": "public/error", "code": 0});
    assert!(check_subscription_refused(&error_method, 7).is_ok());

    let no_code = json!({"method": "subscribe"});
    assert!(check_subscription_refused(&no_code, 7).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_wait_subscribe_ack_skips_unrelated_messages() {
    let mut ws = ScriptedSession::streaming(vec![
        book_msg(CHANNEL, json!([snapshot_item(1)])),
        Step::Msg(json!({"id": 3, "method": "subscribe", "code": 0, "channel": "trade.X"})),
        Step::Msg(json!({"id": 9, "method": "subscribe", "code": 0, "channel": CHANNEL})),
    ]);
    wait_subscribe_ack(&mut ws, 9, CHANNEL, Duration::from_secs(10))
        .await
        .expect("ack for id 9");
}

#[tokio::test(start_paused = true)]
async fn test_wait_subscribe_ack_timeout() {
    let mut ws = ScriptedSession::streaming(vec![]);
    let err = wait_subscribe_ack(&mut ws, 9, CHANNEL, Duration::from_secs(10))
        .await
        .unwrap_err();
    assert!(matches!(err, ConformanceError::AckTimeout { req_id: 9, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_wait_first_data_skips_empty_and_foreign_payloads() {
    let mut ws = ScriptedSession::streaming(vec![
        book_msg(CHANNEL, json!([])),
        book_msg("book.ETHUSD-PERP.10", json!([snapshot_item(5)])),
        Step::Msg(json!({"id": 1, "method": "subscribe", "code": 0})),
        book_msg("book", json!([snapshot_item(6)])),
    ]);
    let payload = wait_first_data(&mut ws, CHANNEL, Duration::from_secs(15))
        .await
        .unwrap();
    assert_eq!(payload["data"][0]["u"], json!(6));
}

#[tokio::test(start_paused = true)]
async fn test_wait_first_data_times_out() {
    let mut ws = ScriptedSession::streaming(vec![book_msg(CHANNEL, json!([]))]);
    let err = wait_first_data(&mut ws, CHANNEL, Duration::from_secs(15))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}
