use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConformanceError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: unexpected status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WsError(String),

    #[error("WebSocket connection closed")]
    ConnectionClosed,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Timed out waiting for subscribe ack (id={req_id}, channel={channel})")]
    AckTimeout { req_id: u64, channel: String },

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl ConformanceError {
    /// Shorthand for a contract violation with a formatted message.
    pub fn contract(msg: impl Into<String>) -> Self {
        ConformanceError::ContractViolation(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ConformanceError::Timeout(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ConformanceError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ConformanceError::WsError(e.to_string())
    }
}
