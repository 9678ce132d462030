pub mod client;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod logging;
pub mod utils;

// Re-export
pub use client::{create_http_client, create_tls_connector};
pub use config::{
    ConfigOverrides, EnvConfig, Environment, RunFile, SubscriptionType, TlsOptions, load_dotenv,
};
pub use errors::ConformanceError;
pub use exchange::{ApiResponse, BookSession, ExchangeTrait, MessageSource, RetryPolicy};
pub use logging::init_tracing;
pub use utils::{get_timestamp_millis, parse_decimal, parse_millis, truncate_for_log};
