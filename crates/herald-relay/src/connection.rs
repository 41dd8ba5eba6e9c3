//! Per-connection handler: decode frames, apply them to the hub, write
//! replies and fan-out back to the socket.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use herald_realtime::protocol::Frame;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::hub::Hub;

/// Handle a single WebSocket connection until either side closes it.
pub async fn handle_connection<S>(ws: tokio_tungstenite::WebSocketStream<S>, addr: SocketAddr, hub: Hub)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<String>(256);
    let conn = hub.connect(tx).await;
    tracing::info!(peer = %addr, conn, "Client connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(text) = outbound else {
                    tracing::debug!(peer = %addr, conn, "Connection dropped by hub");
                    break;
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let replies = match Frame::decode(text.as_str()) {
                            Ok(frame) => hub.handle_frame(conn, frame).await,
                            Err(e) => {
                                tracing::debug!(peer = %addr, error = %e, "Undecodable frame");
                                vec![Frame::error(None, format!("malformed frame: {e}"))]
                            }
                        };
                        if send_frames(&mut sink, &replies).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    hub.disconnect(conn).await;
    tracing::info!(peer = %addr, conn, "Client disconnected");
}

async fn send_frames<S>(sink: &mut S, frames: &[Frame]) -> Result<(), S::Error>
where
    S: futures_util::Sink<Message> + Unpin,
{
    for frame in frames {
        match frame.encode() {
            Ok(json) => sink.send(Message::Text(json.into())).await?,
            Err(e) => tracing::warn!(error = %e, "Failed to encode reply"),
        }
    }
    Ok(())
}
