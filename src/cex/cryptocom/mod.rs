mod types;
pub mod ws;

pub use types::{CANDLE_KEYS, Candle, CandlestickQuery, HeartbeatResponse, SubscriptionRequest};
pub use ws::{WsClient, WsClientOptions};

use crate::common::{
    ApiResponse, ConformanceError, EnvConfig, ExchangeTrait, RetryPolicy, TlsOptions,
    create_http_client,
};
use async_trait::async_trait;

/// Unscoped channel name some acks and payloads carry instead of the full key.
pub const GENERIC_BOOK_CHANNEL: &str = "book";

const CANDLESTICK_ENDPOINT: &str = "public/get-candlestick";
const INSTRUMENTS_ENDPOINT: &str = "public/get-instruments";

/// Order-book channel key, e.g. `book.BTCUSD-PERP.10`.
pub fn book_channel(instrument_name: &str, depth: u32) -> String {
    format!("book.{}.{}", instrument_name, depth)
}

/// REST client for the Crypto.com Exchange public API.
pub struct Cryptocom {
    client: reqwest::Client,
    api_base: String,
    retry: RetryPolicy,
}

impl Cryptocom {
    pub fn new(config: &EnvConfig) -> Result<Self, ConformanceError> {
        Self::with_base(&config.rest_base, &config.tls())
    }

    pub fn with_base(api_base: &str, tls: &TlsOptions) -> Result<Self, ConformanceError> {
        let mut api_base = api_base.trim().to_string();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        Ok(Self {
            client: create_http_client(tls)?,
            api_base,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn get_candlestick(
        &self,
        query: &CandlestickQuery,
    ) -> Result<ApiResponse, ConformanceError> {
        tracing::debug!(?query, "get-candlestick");
        self.get(CANDLESTICK_ENDPOINT, query).await
    }

    pub async fn get_instruments(&self) -> Result<ApiResponse, ConformanceError> {
        self.get(INSTRUMENTS_ENDPOINT, &[] as &[(&str, &str)]).await
    }
}

#[async_trait]
impl ExchangeTrait for Cryptocom {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn exchange_name(&self) -> &str {
        "Crypto.com"
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn health_check(&self) -> Result<(), ConformanceError> {
        // Crypto.com returns {"code": 0, "result": {...}} on success
        let response = self.get_instruments().await?;
        match response.code() {
            Some(0) => Ok(()),
            other => Err(ConformanceError::contract(format!(
                "{} health check: unexpected code {:?}",
                self.exchange_name(),
                other
            ))),
        }
    }
}
