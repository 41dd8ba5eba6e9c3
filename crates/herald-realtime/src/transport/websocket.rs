//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use herald_common::RealtimeError;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::{Transport, TransportEvent, TransportLink};

const CHANNEL_CAPACITY: usize = 256;

/// Transport that opens a WebSocket to a fixed URL.
#[derive(Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &redact_query(&self.url))
            .finish()
    }
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Strip the query string, which may carry credentials.
fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or("")
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self) -> Result<TransportLink, RealtimeError> {
        info!(url = %redact_query(&self.url), "Opening WebSocket");

        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| RealtimeError::Transport(e.to_string()))?;
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

        // Writer: runs until every outbound sender is dropped, then closes.
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                    debug!(error = %e, "WebSocket write failed");
                    return;
                }
            }
            let _ = ws_write.send(WsMessage::Close(None)).await;
            let _ = ws_write.close().await;
            debug!("WebSocket writer finished");
        });

        // Reader: forwards text frames until close, error, or receiver drop.
        tokio::spawn(async move {
            while let Some(msg_result) = ws_read.next().await {
                let event = match msg_result {
                    Ok(WsMessage::Text(text)) => TransportEvent::Frame(text.to_string()),
                    Ok(WsMessage::Close(frame)) => {
                        let reason = frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                        let _ = in_tx.send(TransportEvent::Closed(reason)).await;
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "WebSocket error");
                        let _ = in_tx.send(TransportEvent::Error(e.to_string())).await;
                        return;
                    }
                    // Ping/pong are answered by tungstenite; binary frames are not part of the protocol.
                    Ok(_) => continue,
                };
                if in_tx.send(event).await.is_err() {
                    return;
                }
            }
            let _ = in_tx.send(TransportEvent::Closed(None)).await;
        });

        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
