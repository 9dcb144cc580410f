use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::AUTHORIZATION};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ClientError, ClientResult};

/// Inbound frame, transport-agnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Peer closed the connection
    Close,
    /// Control or binary frame, nothing to do
    Other,
}

/// One open realtime connection
#[async_trait]
pub trait RealtimeConnection: Send {
    /// `None` when the stream ended
    async fn next_frame(&mut self) -> Option<ClientResult<Frame>>;
    async fn ping(&mut self) -> ClientResult<()>;
    async fn close(&mut self);
}

/// Opens realtime connections authenticated by a session token
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(&self, token: &str) -> ClientResult<Box<dyn RealtimeConnection>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// tokio-tungstenite connector for `ws://` / `wss://`
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RealtimeConnector for WsConnector {
    async fn connect(&self, token: &str) -> ClientResult<Box<dyn RealtimeConnection>> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::Config(format!("Invalid realtime URL: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::Config(format!("Invalid token header: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| {
                if let tungstenite::Error::Http(ref resp) = e
                    && resp.status().as_u16() == 401
                {
                    return ClientError::Unauthorized("Realtime connection rejected".into());
                }
                ClientError::Connection(format!("WebSocket connection failed: {e}"))
            })?;

        tracing::debug!(url = %self.url, "WebSocket connected");
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WsStream,
}

#[async_trait]
impl RealtimeConnection for WsConnection {
    async fn next_frame(&mut self) -> Option<ClientResult<Frame>> {
        let message = match self.stream.next().await? {
            Ok(message) => message,
            Err(e) => return Some(Err(ClientError::Connection(e.to_string()))),
        };
        let frame = match message {
            Message::Text(text) => Frame::Text(text.as_str().to_owned()),
            Message::Close(_) => Frame::Close,
            Message::Ping(payload) => {
                if let Err(e) = self.stream.send(Message::Pong(payload)).await {
                    return Some(Err(ClientError::Connection(e.to_string())));
                }
                Frame::Other
            }
            Message::Binary(_) | Message::Pong(_) | Message::Frame(_) => Frame::Other,
        };
        Some(Ok(frame))
    }

    async fn ping(&mut self) -> ClientResult<()> {
        self.stream
            .send(Message::Ping(Default::default()))
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}
