//! `market-conformance-rs`
//!
//! End-to-end conformance checks for the Crypto.com Exchange market-data API:
//! the `public/get-candlestick` REST endpoint and the `book.{instrument}.{depth}`
//! WebSocket channel.
//!
//! ## Quickstart (REST)
//!
//! ```no_run
//! use market_conformance_rs::{CandlestickQuery, Cryptocom, TlsOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), market_conformance_rs::ConformanceError> {
//! let api = Cryptocom::with_base("https://api.crypto.com/exchange/v1/", &TlsOptions::default())?;
//! let response = api
//!     .get_candlestick(&CandlestickQuery::new("BTCUSD-PERP", "M1").count(10))
//!     .await?;
//! println!("status={} code={:?}", response.status, response.code());
//! # Ok(())
//! # }
//! ```
//!
//! ## Quickstart (order-book stream)
//!
//! ```no_run
//! use market_conformance_rs::{
//!     DeltaCheckConfig, WsClient, WsClientOptions, book_channel, check_delta_sequence,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), market_conformance_rs::ConformanceError> {
//! let mut ws = WsClient::connect(
//!     "wss://stream.crypto.com/exchange/v1/market",
//!     WsClientOptions::default(),
//! )
//! .await?;
//! let config = DeltaCheckConfig::new(book_channel("BTCUSD-PERP", 50), Default::default());
//! let outcome = check_delta_sequence(&mut ws, &config).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod book;
pub mod candlestick;
pub mod cex;
pub mod common;
pub mod scenarios;

pub use book::{
    DeltaCheckConfig, SequenceOutcome, UpdateCursor, check_delta_sequence, find_consistent_delta,
};
pub use candlestick::{ErrorKind, ErrorOutcome, TestData, Timeframe, TimeframeAliases};
pub use cex::Cryptocom;
pub use cex::cryptocom::{CandlestickQuery, WsClient, WsClientOptions, book_channel};
pub use common::{
    ApiResponse, BookSession, ConformanceError, EnvConfig, Environment, ExchangeTrait,
    MessageSource, SubscriptionType, TlsOptions,
};
pub use scenarios::{ScenarioOutcome, ScenarioReport};
