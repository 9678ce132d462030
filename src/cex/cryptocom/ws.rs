//! Crypto.com market-data WebSocket client.
//!
//! A single background task owns the socket. It answers `public/heartbeat`
//! frames itself, forwards outbound frames queued by [WsClient], and pushes
//! every other decoded JSON message onto an unbounded FIFO queue that
//! [WsClient::recv] drains. When the socket closes or fails the task ends,
//! the queue sender is dropped, and pending or later receives observe
//! [ConformanceError::ConnectionClosed] instead of hanging.

use super::types::{HeartbeatResponse, SubscriptionRequest};
use crate::common::{
    BookSession, ConformanceError, EnvConfig, MessageSource, TlsOptions, create_tls_connector,
    get_timestamp_millis,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
const HEARTBEAT_METHOD: &str = "public/heartbeat";
const HEARTBEAT_RESPONSE_METHOD: &str = "public/respond-heartbeat";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Inbound = Result<Value, ConformanceError>;

#[derive(Debug, Clone)]
pub struct WsClientOptions {
    /// Pause after the handshake before the client is handed out. The
    /// exchange rate-limits requests sent immediately after connecting.
    pub connect_delay: Duration,
    pub tls: TlsOptions,
}

impl Default for WsClientOptions {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_secs(1),
            tls: TlsOptions::default(),
        }
    }
}

enum Command {
    Send(Message),
    Close,
}

pub struct WsClient {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    task: Option<JoinHandle<()>>,
    last_request_id: u64,
}

impl WsClient {
    pub async fn connect(url: &str, options: WsClientOptions) -> Result<Self, ConformanceError> {
        let connector = create_tls_connector(&options.tls)?.map(Connector::NativeTls);

        tracing::debug!(url, "connecting market WebSocket");
        let (socket, _) = tokio::time::timeout(
            CONNECT_TIMEOUT,
            tokio_tungstenite::connect_async_tls_with_config(url, None, false, connector),
        )
        .await
        .map_err(|_| ConformanceError::Timeout(CONNECT_TIMEOUT))??;

        if !options.connect_delay.is_zero() {
            tokio::time::sleep(options.connect_delay).await;
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_socket(socket, command_rx, inbound_tx));
        tracing::debug!(url, "market WebSocket connected");

        Ok(Self {
            url: url.to_string(),
            commands: command_tx,
            inbound: inbound_rx,
            task: Some(task),
            last_request_id: 0,
        })
    }

    pub async fn from_config(config: &EnvConfig) -> Result<Self, ConformanceError> {
        let options = WsClientOptions {
            tls: config.tls(),
            ..WsClientOptions::default()
        };
        Self::connect(&config.ws_market_url, options).await
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queues a JSON frame for the socket task.
    pub fn send_json(&self, value: &impl serde::Serialize) -> Result<(), ConformanceError> {
        let text = serde_json::to_string(value)?;
        self.commands
            .send(Command::Send(Message::Text(text)))
            .map_err(|_| ConformanceError::ConnectionClosed)
    }

    /// Epoch-millis request id, bumped when two requests land in the same millisecond.
    fn next_request_id(&mut self) -> u64 {
        let id = get_timestamp_millis().max(self.last_request_id + 1);
        self.last_request_id = id;
        id
    }

    fn send_request(
        &mut self,
        method: &'static str,
        params: Map<String, Value>,
    ) -> Result<u64, ConformanceError> {
        let id = self.next_request_id();
        let request = SubscriptionRequest {
            id,
            method,
            params,
            nonce: get_timestamp_millis(),
        };
        self.send_json(&request)?;
        tracing::debug!(id, method, "request sent");
        Ok(id)
    }

    /// Closes the socket and waits briefly for the task to finish.
    pub async fn close(mut self) -> Result<(), ConformanceError> {
        let _ = self.commands.send(Command::Close);
        if let Some(task) = self.task.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, task).await {
                Ok(_) => {}
                Err(_) => tracing::warn!(url = %self.url, "socket task did not stop in time"),
            }
        }
        Ok(())
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl MessageSource for WsClient {
    async fn recv(&mut self, timeout: Duration) -> Result<Value, ConformanceError> {
        match tokio::time::timeout(timeout, self.inbound.recv()).await {
            Ok(Some(item)) => item,
            Ok(None) => Err(ConformanceError::ConnectionClosed),
            Err(_) => Err(ConformanceError::Timeout(timeout)),
        }
    }
}

#[async_trait]
impl BookSession for WsClient {
    async fn subscribe(
        &mut self,
        channels: &[String],
        extra_params: Option<&Map<String, Value>>,
    ) -> Result<u64, ConformanceError> {
        let mut params = Map::new();
        params.insert("channels".to_string(), Value::from(channels.to_vec()));
        if let Some(extra) = extra_params {
            for (k, v) in extra {
                params.insert(k.clone(), v.clone());
            }
        }
        self.send_request("subscribe", params)
    }

    async fn unsubscribe(&mut self, channels: &[String]) -> Result<u64, ConformanceError> {
        let mut params = Map::new();
        params.insert("channels".to_string(), Value::from(channels.to_vec()));
        self.send_request("unsubscribe", params)
    }
}

async fn run_socket(
    mut socket: Socket,
    mut commands: mpsc::UnboundedReceiver<Command>,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(frame)) => {
                    if let Err(e) = socket.send(frame).await {
                        let _ = inbound.send(Err(e.into()));
                        break;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = socket.close(None).await;
                    break;
                }
            },
            frame = socket.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => continue,
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!("market WebSocket closed by peer");
                        break;
                    }
                    // tungstenite queues pong replies itself
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = inbound.send(Err(e.into()));
                        break;
                    }
                };

                let value: Value = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::debug!("skipping non-JSON frame: {}", e);
                        continue;
                    }
                };

                if value.get("method").and_then(Value::as_str) == Some(HEARTBEAT_METHOD) {
                    let reply = HeartbeatResponse {
                        id: value.get("id").cloned().unwrap_or(Value::Null),
                        method: HEARTBEAT_RESPONSE_METHOD,
                    };
                    let reply = match serde_json::to_string(&reply) {
                        Ok(r) => r,
                        Err(_) => continue,
                    };
                    tracing::debug!(%reply, "answering heartbeat");
                    if let Err(e) = socket.send(Message::Text(reply)).await {
                        let _ = inbound.send(Err(e.into()));
                        break;
                    }
                    continue;
                }

                if inbound.send(Ok(value)).is_err() {
                    // consumer is gone
                    break;
                }
            }
        }
    }
}
