//! `public/get-candlestick` scenarios.

use super::{ScenarioContext, ScenarioReport, run_scenario};
use crate::candlestick::{
    CaseInput, ErrorKind, ErrorOutcome, TimeframeAliases, assert_count_within, assert_empty_result,
    assert_ohlc_ok, assert_sorted_by_t, assert_time_in_window_with_alignment, candle_data,
    expect_error_outcome, extract_result, interval_ms,
};
use crate::cex::cryptocom::{CandlestickQuery, Cryptocom};
use crate::common::{ApiResponse, ConformanceError, get_timestamp_millis, parse_millis};
use serde_json::Value;

const HOUR_MS: i64 = 60 * 60 * 1000;

fn expect_code_zero(response: &ApiResponse) -> Result<(), ConformanceError> {
    if response.code() != Some(0) {
        return Err(ConformanceError::contract(format!(
            "unexpected code: {}",
            response.body
        )));
    }
    Ok(())
}

fn now_millis() -> i64 {
    get_timestamp_millis() as i64
}

/// Latest candles for one `(timeframe, count)` case: interval echoes the
/// timeframe, `0 < len <= count`, ordered, OHLC bounds hold.
pub async fn valid_case(
    api: &Cryptocom,
    instrument_name: &str,
    aliases: &TimeframeAliases,
    tf_str: &str,
    count: i64,
) -> Result<(), ConformanceError> {
    let timeframe = aliases.normalize(tf_str);
    let response = api
        .get_candlestick(&CandlestickQuery::new(instrument_name, &timeframe).count(count))
        .await?;
    expect_code_zero(&response)?;

    let result = extract_result(&response.body)?;
    let interval = result.get("interval").and_then(Value::as_str);
    if interval != Some(timeframe.as_str()) {
        return Err(ConformanceError::contract(format!(
            "interval {:?} != requested timeframe {}",
            interval, timeframe
        )));
    }

    let data = candle_data(result)?;
    assert_count_within(data.len(), count)?;
    assert_sorted_by_t(data)?;
    for candle in data {
        assert_ohlc_ok(candle)?;
    }
    Ok(())
}

/// Candles for the last hour all open within the window, allowing one
/// interval of alignment before `start_ts`.
pub async fn time_window_recent_hour(
    api: &Cryptocom,
    instrument_name: &str,
    aliases: &TimeframeAliases,
    tf_str: &str,
    count: i64,
) -> Result<(), ConformanceError> {
    let end_ts = now_millis();
    let start_ts = end_ts - HOUR_MS;
    let timeframe = aliases.normalize(tf_str);

    let query = CandlestickQuery::new(instrument_name, &timeframe)
        .count(count)
        .window(start_ts, end_ts);
    let response = api.get_candlestick(&query).await?;
    expect_code_zero(&response)?;

    let data = candle_data(extract_result(&response.body)?)?;
    assert_sorted_by_t(data)?;
    let tf_ms = interval_ms(&timeframe);
    for candle in data {
        let t = candle
            .get("t")
            .ok_or_else(|| ConformanceError::contract(format!("missing key t: {}", candle)))
            .and_then(|v| parse_millis(v, "t"))?;
        assert_time_in_window_with_alignment(t, start_ts, end_ts, tf_ms)?;
        assert_ohlc_ok(candle)?;
    }
    Ok(())
}

/// A large `count` is capped by the server, never exceeded.
pub async fn large_count_limit(
    api: &Cryptocom,
    instrument_name: &str,
    aliases: &TimeframeAliases,
    case: &CaseInput,
) -> Result<(), ConformanceError> {
    let timeframe = aliases.normalize(&case.timeframe);
    let response = api
        .get_candlestick(&CandlestickQuery::new(instrument_name, timeframe).count(case.count))
        .await?;
    expect_code_zero(&response)?;
    let data = candle_data(extract_result(&response.body)?)?;
    assert_count_within(data.len(), case.count)
}

fn expect_hard_error(outcome: &ErrorOutcome, keyword: &str) -> Result<(), ConformanceError> {
    match outcome {
        ErrorOutcome::HardError { status, body } if *status == 400 || body.contains(keyword) => {
            Ok(())
        }
        other => Err(ConformanceError::contract(format!(
            "expected HTTP 400 or '{}', got {:?}",
            keyword, other
        ))),
    }
}

/// Unknown timeframe code is refused with a hard error.
pub async fn invalid_timeframe(
    api: &Cryptocom,
    instrument_name: &str,
    case: &CaseInput,
) -> Result<(), ConformanceError> {
    let query = CandlestickQuery::new(instrument_name, &case.timeframe).count(case.count);
    let outcome = expect_error_outcome(api.get_candlestick(&query).await, &[ErrorKind::HardError])?;
    expect_hard_error(&outcome, "Invalid request")
}

/// `count=0` is refused with a hard error.
pub async fn count_zero(
    api: &Cryptocom,
    instrument_name: &str,
    aliases: &TimeframeAliases,
    case: &CaseInput,
) -> Result<(), ConformanceError> {
    let query = CandlestickQuery::new(instrument_name, aliases.normalize(&case.timeframe))
        .count(case.count);
    let outcome = expect_error_outcome(api.get_candlestick(&query).await, &[ErrorKind::HardError])?;
    expect_hard_error(&outcome, "Count must be positive")
}

/// An inverted window (`start_ts > end_ts`) yields a `result` with empty
/// `data`, whatever `code` accompanies it.
pub async fn start_after_end(
    api: &Cryptocom,
    instrument_name: &str,
    aliases: &TimeframeAliases,
    case: &CaseInput,
) -> Result<(), ConformanceError> {
    let now = now_millis();
    let query = CandlestickQuery::new(instrument_name, aliases.normalize(&case.timeframe))
        .count(case.count)
        .window(now, now - HOUR_MS);
    let response = api.get_candlestick(&query).await?;
    assert_empty_result(&response.body)
}

/// An unknown instrument may be refused outright, answered with a non-zero
/// code, or answered with no data; all three are accepted.
pub async fn invalid_instrument(api: &Cryptocom, bad_instrument: &str) -> Result<(), ConformanceError> {
    let query = CandlestickQuery::new(bad_instrument, "M5").count(5);
    let outcome = expect_error_outcome(
        api.get_candlestick(&query).await,
        &[ErrorKind::HardError, ErrorKind::SoftNonZero, ErrorKind::SoftEmpty],
    )?;
    if let ErrorOutcome::HardError { status, body } = &outcome {
        if *status != 400 && !body.contains("Invalid") {
            return Err(ConformanceError::contract(format!(
                "unexpected hard error for invalid instrument: {} {}",
                status, body
            )));
        }
    }
    Ok(())
}

pub async fn run_rest_suite(
    api: &Cryptocom,
    ctx: &ScenarioContext,
) -> Result<Vec<ScenarioReport>, ConformanceError> {
    let instrument = ctx.config.instrument_name.as_str();
    let td = &ctx.test_data;
    let aliases = ctx.test_data.timeframe_aliases()?;
    let mut reports = Vec::new();

    for (tf, count) in &td.valid_cases {
        let name = format!("rest::valid_case[{}-{}]", tf, count);
        reports.push(run_scenario(name, valid_case(api, instrument, &aliases, tf, *count)).await);
    }
    for (tf, count) in &td.time_range_cases {
        let name = format!("rest::time_window_recent_hour[{}-{}]", tf, count);
        reports.push(
            run_scenario(name, time_window_recent_hour(api, instrument, &aliases, tf, *count)).await,
        );
    }
    reports.push(
        run_scenario(
            "rest::large_count_limit",
            large_count_limit(api, instrument, &aliases, &td.limits.large_count),
        )
        .await,
    );
    reports.push(
        run_scenario(
            "rest::invalid_timeframe",
            invalid_timeframe(api, instrument, &td.negatives.invalid_timeframe),
        )
        .await,
    );
    reports.push(
        run_scenario(
            "rest::count_zero",
            count_zero(api, instrument, &aliases, &td.negatives.count_zero),
        )
        .await,
    );
    reports.push(
        run_scenario(
            "rest::start_after_end",
            start_after_end(api, instrument, &aliases, &td.negatives.start_after_end),
        )
        .await,
    );
    reports.push(
        run_scenario(
            "rest::invalid_instrument",
            invalid_instrument(api, &td.negatives.invalid_instrument_literal),
        )
        .await,
    );
    Ok(reports)
}
