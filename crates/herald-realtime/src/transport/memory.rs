//! In-process transport.
//!
//! `MemoryTransport` hands each opened link to a `MemoryServer`, whose
//! `MemoryPeer`s play the server side: read what the client sent, push
//! frames back, close the stream. Used by tests and by embedders that run
//! the broker in the same process.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_common::RealtimeError;
use tokio::sync::mpsc;

use super::{Transport, TransportEvent, TransportLink};
use crate::protocol::{Command, Frame};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct OpenPlan {
    failures: VecDeque<RealtimeError>,
    opened: usize,
}

/// Client half: implements `Transport`.
#[derive(Clone)]
pub struct MemoryTransport {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    plan: Arc<Mutex<OpenPlan>>,
}

/// Server half: yields one `MemoryPeer` per successful `open`.
pub struct MemoryServer {
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
}

/// Server side of one open link.
pub struct MemoryPeer {
    to_client: mpsc::Sender<TransportEvent>,
    from_client: mpsc::Receiver<String>,
}

impl MemoryTransport {
    pub fn new() -> (Self, MemoryServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                peers: tx,
                plan: Arc::new(Mutex::new(OpenPlan::default())),
            },
            MemoryServer { peers: rx },
        )
    }

    /// Make the next `open` fail with `error`. Queued failures are used in order.
    pub fn fail_next_open(&self, error: RealtimeError) {
        self.plan
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failures
            .push_back(error);
    }

    /// Number of `open` calls that produced a link.
    pub fn opened(&self) -> usize {
        self.plan.lock().unwrap_or_else(|e| e.into_inner()).opened
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self) -> Result<TransportLink, RealtimeError> {
        {
            let mut plan = self.plan.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(error) = plan.failures.pop_front() {
                return Err(error);
            }
            plan.opened += 1;
        }

        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let peer = MemoryPeer {
            to_client: in_tx,
            from_client: out_rx,
        };
        self.peers
            .send(peer)
            .map_err(|_| RealtimeError::Transport("memory server dropped".into()))?;

        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

impl MemoryServer {
    /// Wait for the next opened link.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.recv().await
    }
}

impl MemoryPeer {
    /// Next raw text frame from the client; `None` once the client dropped the link.
    pub async fn recv_text(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next decoded frame from the client, skipping heartbeats.
    pub async fn recv_frame(&mut self) -> Option<Frame> {
        loop {
            let text = self.from_client.recv().await?;
            match Frame::decode(&text) {
                Ok(frame) if frame.command == Command::Heartbeat => continue,
                Ok(frame) => return Some(frame),
                Err(_) => continue,
            }
        }
    }

    /// Frames already queued by the client, heartbeats included, without waiting.
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(text) = self.from_client.try_recv() {
            if let Ok(frame) = Frame::decode(&text) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Read the registration frame and acknowledge it.
    pub async fn accept_registration(&mut self) -> Option<Frame> {
        let frame = self.recv_frame().await?;
        self.send(&Frame::ack(frame.frame_ref.clone())).await;
        Some(frame)
    }

    pub async fn send(&self, frame: &Frame) -> bool {
        match frame.encode() {
            Ok(text) => self.send_text(text).await,
            Err(_) => false,
        }
    }

    pub async fn send_text(&self, text: impl Into<String>) -> bool {
        self.to_client
            .send(TransportEvent::Frame(text.into()))
            .await
            .is_ok()
    }

    /// Deliver a `message` frame on `topic`.
    pub async fn publish(&self, topic: &str, body: &str) -> bool {
        self.send(&Frame::message(topic, body)).await
    }

    /// Close the stream as the server would.
    pub async fn close(self, reason: Option<&str>) {
        let _ = self
            .to_client
            .send(TransportEvent::Closed(reason.map(str::to_string)))
            .await;
    }

    /// Whether the client has dropped its side of the link.
    pub fn is_client_gone(&self) -> bool {
        self.to_client.is_closed()
    }
}
