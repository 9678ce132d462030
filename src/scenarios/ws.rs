//! Order-book WebSocket scenarios. Each runs on its own connection.

use super::{ScenarioContext, ScenarioReport, run_scenario};
use crate::book::{
    DeltaCheckConfig, SequenceOutcome, assert_book_snapshot, check_delta_sequence,
    check_subscription_refused, wait_first_data, wait_subscribe_ack,
};
use crate::cex::cryptocom::{WsClient, book_channel};
use crate::common::{BookSession, ConformanceError, EnvConfig, SubscriptionType};
use serde_json::{Map, Value};
use std::time::Duration;

pub const SNAPSHOT_DEPTHS: [u32; 2] = [10, 50];
pub const INVALID_DEPTH: u32 = 9999;

const ACK_TIMEOUT: Duration = Duration::from_secs(10);
const FIRST_DATA_TIMEOUT: Duration = Duration::from_secs(15);

fn book_params(subscription_type: SubscriptionType, update_frequency: u32) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert(
        "book_subscription_type".to_string(),
        Value::from(subscription_type.as_str()),
    );
    params.insert(
        "book_update_frequency".to_string(),
        Value::from(update_frequency),
    );
    params
}

/// SNAPSHOT subscription: the ack validates and the first snapshot has
/// `u`/`t`/`bids`/`asks` with well-formed levels.
pub async fn book_snapshot_ok<S>(
    ws: &mut S,
    instrument_name: &str,
    depth: u32,
    update_frequency: u32,
) -> Result<(), ConformanceError>
where
    S: BookSession + ?Sized,
{
    let channel = book_channel(instrument_name, depth);
    let params = book_params(SubscriptionType::Snapshot, update_frequency);
    let req_id = ws.subscribe(std::slice::from_ref(&channel), Some(&params)).await?;

    wait_subscribe_ack(ws, req_id, &channel, ACK_TIMEOUT).await?;
    let payload = wait_first_data(ws, &channel, FIRST_DATA_TIMEOUT).await?;
    assert_book_snapshot(&payload)?;
    Ok(())
}

/// Delta stream shows a gapless `pu` -> `u` link at least once per budget, with one
/// resubscribe retry. Two misses are inconclusive, not a failure. Always
/// subscribes with SNAPSHOT_AND_UPDATE whatever the configured type.
pub async fn book_delta_sequence<S>(
    ws: &mut S,
    config: &EnvConfig,
) -> Result<SequenceOutcome, ConformanceError>
where
    S: BookSession + ?Sized,
{
    if config.book_subscription_type != SubscriptionType::SnapshotAndUpdate {
        tracing::warn!(
            "book_subscription_type {} carries no deltas; using {} for the delta sequence check",
            config.book_subscription_type.as_str(),
            SubscriptionType::SnapshotAndUpdate.as_str()
        );
    }
    let channel = book_channel(&config.instrument_name, config.depth);
    let params = book_params(SubscriptionType::SnapshotAndUpdate, config.book_update_frequency);
    check_delta_sequence(ws, &DeltaCheckConfig::new(channel, params)).await
}

/// Subscribing to an unsupported depth is refused.
pub async fn book_invalid_depth<S>(ws: &mut S, instrument_name: &str) -> Result<(), ConformanceError>
where
    S: BookSession + ?Sized,
{
    let channel = book_channel(instrument_name, INVALID_DEPTH);
    let req_id = ws.subscribe(std::slice::from_ref(&channel), None).await?;
    let msg = ws.recv(ACK_TIMEOUT).await?;
    check_subscription_refused(&msg, req_id)
}

pub async fn run_ws_suite(ctx: &ScenarioContext) -> Vec<ScenarioReport> {
    let config = &ctx.config;
    let mut reports = Vec::new();

    for depth in SNAPSHOT_DEPTHS {
        let name = format!("ws::book_snapshot_ok[{}]", depth);
        reports.push(
            run_scenario(name, async {
                let mut ws = WsClient::from_config(config).await?;
                let result = book_snapshot_ok(
                    &mut ws,
                    &config.instrument_name,
                    depth,
                    config.book_update_frequency,
                )
                .await;
                ws.close().await?;
                result
            })
            .await,
        );
    }

    reports.push(
        run_scenario("ws::book_delta_sequence", async {
            let mut ws = WsClient::from_config(config).await?;
            let result = book_delta_sequence(&mut ws, config).await;
            ws.close().await?;
            result
        })
        .await,
    );

    reports.push(
        run_scenario("ws::book_invalid_depth", async {
            let mut ws = WsClient::from_config(config).await?;
            let result = book_invalid_depth(&mut ws, &config.instrument_name).await;
            ws.close().await?;
            result
        })
        .await,
    );

    reports
}
