//! Connected clients, their presence and their topic subscriptions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use herald_realtime::protocol::{destinations, Command, Frame, LocationUpdate, Registration};
use tokio::sync::{mpsc, RwLock};

use crate::protocol::{is_server_owned, is_topic, PresenceCounts};

/// Identifier of one websocket connection.
pub type ConnId = u64;

/// A connected client.
struct Client {
    /// Set once the registration frame was accepted.
    identity: Option<(String, String)>,
    subscriptions: HashSet<String>,
    tx: mpsc::Sender<String>,
    last_seen: Instant,
}

impl Client {
    fn deliver(&self, frame: &Frame) -> bool {
        let Ok(text) = frame.encode() else {
            return false;
        };
        self.tx.try_send(text).is_ok()
    }
}

/// Thread-safe client store shared by every connection task.
#[derive(Clone)]
pub struct Hub {
    clients: Arc<RwLock<HashMap<ConnId, Client>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Track a new connection. Frames for it are pushed into `tx`.
    pub async fn connect(&self, tx: mpsc::Sender<String>) -> ConnId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients.write().await.insert(
            id,
            Client {
                identity: None,
                subscriptions: HashSet::new(),
                tx,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Forget a connection. Returns `true` if it was tracked.
    pub async fn disconnect(&self, conn: ConnId) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.remove(&conn) else {
            return false;
        };
        if client.identity.is_some() {
            broadcast_counts(&clients);
        }
        true
    }

    /// Apply one inbound frame. Returns the replies for the sender.
    pub async fn handle_frame(&self, conn: ConnId, frame: Frame) -> Vec<Frame> {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.get_mut(&conn) else {
            return Vec::new();
        };
        client.last_seen = Instant::now();

        match frame.command {
            Command::Heartbeat => vec![Frame::heartbeat()],
            Command::Subscribe => {
                let Some(topic) = frame.destination.filter(|d| is_topic(d)) else {
                    return vec![Frame::error(frame.frame_ref, "not a topic")];
                };
                client.subscriptions.insert(topic.clone());
                let mut replies = vec![Frame::ack(frame.frame_ref)];
                if is_server_owned(&topic) {
                    replies.extend(counts_of(&clients).to_frame());
                }
                replies
            }
            Command::Unsubscribe => {
                if let Some(topic) = &frame.destination {
                    client.subscriptions.remove(topic);
                }
                Vec::new()
            }
            Command::Send => {
                let destination = frame.destination.unwrap_or_default();
                let body = frame.body.unwrap_or_default();
                match destination.as_str() {
                    destinations::REGISTRATION => {
                        match serde_json::from_str::<Registration>(&body) {
                            Ok(reg) if !reg.client_id.trim().is_empty() => {
                                tracing::info!(
                                    conn,
                                    client_id = %reg.client_id,
                                    location = %reg.location,
                                    "Client registered"
                                );
                                client.identity = Some((reg.client_id, reg.location));
                                broadcast_counts(&clients);
                                vec![Frame::ack(frame.frame_ref)]
                            }
                            Ok(_) => vec![Frame::error(frame.frame_ref, "empty client id")],
                            Err(e) => vec![Frame::error(
                                frame.frame_ref,
                                format!("invalid registration: {e}"),
                            )],
                        }
                    }
                    destinations::LOCATION_UPDATE => {
                        let Some((_, location)) = client.identity.as_mut() else {
                            return vec![Frame::error(frame.frame_ref, "not registered")];
                        };
                        match serde_json::from_str::<LocationUpdate>(&body) {
                            Ok(update) => {
                                *location = update.location;
                                broadcast_counts(&clients);
                                Vec::new()
                            }
                            Err(e) => vec![Frame::error(
                                frame.frame_ref,
                                format!("invalid location update: {e}"),
                            )],
                        }
                    }
                    topic if is_topic(topic) && !is_server_owned(topic) => {
                        let delivered = publish(&clients, topic, &body);
                        tracing::debug!(conn, topic, delivered, "Relayed message");
                        Vec::new()
                    }
                    other => vec![Frame::error(
                        frame.frame_ref,
                        format!("unknown destination: {other}"),
                    )],
                }
            }
            Command::Message | Command::Ack | Command::Error => {
                vec![Frame::error(frame.frame_ref, "unexpected command")]
            }
        }
    }

    pub async fn counts(&self) -> PresenceCounts {
        counts_of(&*self.clients.read().await)
    }

    /// Drop connections that sent nothing for `max_idle`. Their channels
    /// close, which ends the connection task.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut clients = self.clients.write().await;
        let now = Instant::now();
        let before = clients.len();
        let mut lost_registered = false;
        clients.retain(|id, client| {
            let keep = now.duration_since(client.last_seen) < max_idle;
            if !keep {
                tracing::info!(conn = id, "Reaping idle connection");
                lost_registered |= client.identity.is_some();
            }
            keep
        });
        if lost_registered {
            broadcast_counts(&clients);
        }
        before - clients.len()
    }

    pub async fn count(&self) -> usize {
        self.clients.read().await.len()
    }
}

fn counts_of(clients: &HashMap<ConnId, Client>) -> PresenceCounts {
    let mut by_location: BTreeMap<String, u64> = BTreeMap::new();
    for (_, location) in clients.values().filter_map(|c| c.identity.as_ref()) {
        *by_location.entry(location.clone()).or_default() += 1;
    }
    PresenceCounts {
        total: by_location.values().sum(),
        by_location,
    }
}

fn broadcast_counts(clients: &HashMap<ConnId, Client>) {
    let Some(frame) = counts_of(clients).to_frame() else {
        return;
    };
    for client in clients.values() {
        if client.subscriptions.contains(destinations::PRESENCE_COUNTS) {
            client.deliver(&frame);
        }
    }
}

fn publish(clients: &HashMap<ConnId, Client>, topic: &str, body: &str) -> usize {
    let frame = Frame::message(topic, body);
    clients
        .values()
        .filter(|c| c.subscriptions.contains(topic))
        .filter(|c| c.deliver(&frame))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn join(hub: &Hub) -> (ConnId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        (hub.connect(tx).await, rx)
    }

    async fn register(hub: &Hub, conn: ConnId, client_id: &str, location: &str) -> Vec<Frame> {
        let body = serde_json::to_string(&Registration {
            client_id: client_id.into(),
            location: location.into(),
        })
        .unwrap();
        hub.handle_frame(conn, Frame::send(destinations::REGISTRATION, body).with_ref("7"))
            .await
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(text) = rx.try_recv() {
            frames.push(Frame::decode(&text).unwrap());
        }
        frames
    }

    fn last_counts(rx: &mut mpsc::Receiver<String>) -> PresenceCounts {
        let frame = drain(rx).pop().expect("no counts broadcast");
        serde_json::from_str(frame.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn registration_is_acked_with_its_ref() {
        let hub = Hub::new();
        let (conn, _rx) = join(&hub).await;
        let replies = register(&hub, conn, "visitor-ab12cd", "public").await;
        assert_eq!(replies, vec![Frame::ack(Some("7".into()))]);
        assert_eq!(hub.counts().await.total, 1);
    }

    #[tokio::test]
    async fn empty_client_id_is_rejected() {
        let hub = Hub::new();
        let (conn, _rx) = join(&hub).await;
        let replies = register(&hub, conn, "  ", "public").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].command, Command::Error);
        assert_eq!(replies[0].frame_ref.as_deref(), Some("7"));
        assert_eq!(hub.counts().await.total, 0);
    }

    #[tokio::test]
    async fn presence_subscription_gets_counts_on_every_change() {
        let hub = Hub::new();
        let (watcher, mut watcher_rx) = join(&hub).await;
        let replies = hub
            .handle_frame(watcher, Frame::subscribe(destinations::PRESENCE_COUNTS))
            .await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].command, Command::Message);

        let (a, _a_rx) = join(&hub).await;
        let (b, _b_rx) = join(&hub).await;
        register(&hub, a, "alice", "public").await;
        register(&hub, b, "bob", "public").await;
        let counts = last_counts(&mut watcher_rx);
        assert_eq!(counts.total, 2);
        assert_eq!(counts.by_location.get("public"), Some(&2));

        let update = serde_json::to_string(&LocationUpdate {
            location: "admin".into(),
        })
        .unwrap();
        hub.handle_frame(b, Frame::send(destinations::LOCATION_UPDATE, update))
            .await;
        let counts = last_counts(&mut watcher_rx);
        assert_eq!(counts.by_location.get("public"), Some(&1));
        assert_eq!(counts.by_location.get("admin"), Some(&1));

        assert!(hub.disconnect(a).await);
        let counts = last_counts(&mut watcher_rx);
        assert_eq!(counts.total, 1);
        assert_eq!(counts.by_location.get("public"), None);
    }

    #[tokio::test]
    async fn location_update_requires_registration() {
        let hub = Hub::new();
        let (conn, _rx) = join(&hub).await;
        let replies = hub
            .handle_frame(
                conn,
                Frame::send(destinations::LOCATION_UPDATE, r#"{"location":"admin"}"#),
            )
            .await;
        assert_eq!(replies[0].command, Command::Error);
    }

    #[tokio::test]
    async fn topic_messages_reach_subscribers_only() {
        let hub = Hub::new();
        let (publisher, _p_rx) = join(&hub).await;
        let (sub, mut sub_rx) = join(&hub).await;
        let (other, mut other_rx) = join(&hub).await;
        hub.handle_frame(sub, Frame::subscribe("topic-backups")).await;
        hub.handle_frame(other, Frame::subscribe("topic-deploys")).await;

        hub.handle_frame(publisher, Frame::send("topic-backups", "Backup completed"))
            .await;

        let frames = drain(&mut sub_rx);
        assert_eq!(frames, vec![Frame::message("topic-backups", "Backup completed")]);
        assert!(drain(&mut other_rx).is_empty());

        hub.handle_frame(sub, Frame::unsubscribe("topic-backups")).await;
        hub.handle_frame(publisher, Frame::send("topic-backups", "again"))
            .await;
        assert!(drain(&mut sub_rx).is_empty());
    }

    #[tokio::test]
    async fn clients_cannot_publish_presence_counts() {
        let hub = Hub::new();
        let (conn, _rx) = join(&hub).await;
        let replies = hub
            .handle_frame(
                conn,
                Frame::send(destinations::PRESENCE_COUNTS, r#"{"total":99}"#),
            )
            .await;
        assert_eq!(replies[0].command, Command::Error);
    }

    #[tokio::test]
    async fn heartbeat_is_answered() {
        let hub = Hub::new();
        let (conn, _rx) = join(&hub).await;
        let replies = hub.handle_frame(conn, Frame::heartbeat()).await;
        assert_eq!(replies, vec![Frame::heartbeat()]);
    }

    #[tokio::test]
    async fn idle_connections_are_reaped() {
        let hub = Hub::new();
        let (conn, mut rx) = join(&hub).await;
        register(&hub, conn, "alice", "public").await;

        assert_eq!(hub.reap_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(hub.reap_idle(Duration::ZERO).await, 1);
        assert_eq!(hub.count().await, 0);
        assert_eq!(hub.counts().await.total, 0);
        // Sender dropped with the client.
        assert!(rx.recv().await.is_none());
    }
}
