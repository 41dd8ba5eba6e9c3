//! `PresenceClient`: the public face of the connection manager and
//! subscription registry.
//!
//! The client is cheap to clone. All clones share one connection; the
//! background session is cancelled when the last clone is dropped.

use std::sync::Arc;

use herald_common::RealtimeError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::DropGuard;
use tracing::{debug, info, warn};

use crate::connection::state::{Begin, Shared};
use crate::connection::{ConnectionEvent, ConnectionState, ConnectionStatus, RealtimeConfig, Session};
use crate::identity::ClientIdentity;
use crate::presence::PresenceState;
use crate::protocol::{destinations, Frame, LocationUpdate};
use crate::registry::{Delivery, SubscriptionHandle};
use crate::transport::Transport;

const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PresenceClient {
    transport: Arc<dyn Transport>,
    config: RealtimeConfig,
    shared: Arc<Shared>,
    _guard: Arc<DropGuard>,
}

impl std::fmt::Debug for PresenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceClient")
            .field("config", &self.config)
            .field("status", &self.shared.status())
            .finish()
    }
}

impl PresenceClient {
    /// Build a disconnected client. Connection events arrive on the returned receiver.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: RealtimeConfig,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared::new(events_tx));
        let guard = shared.root.clone().drop_guard();
        (
            Self {
                transport,
                config,
                shared,
                _guard: Arc::new(guard),
            },
            events_rx,
        )
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Connect and register as `client_id` at `location`.
    ///
    /// Resolves with the connection generation once the server acknowledges
    /// the registration or the settle window passes without an answer.
    /// Returns the current generation immediately when already connected.
    /// A `connect` issued while another is still in flight supersedes it;
    /// the earlier call resolves with `RealtimeError::Cancelled`.
    pub async fn connect(&self, client_id: &str, location: &str) -> Result<u64, RealtimeError> {
        let (epoch, token) = match self.shared.begin(client_id, location) {
            Begin::AlreadyConnected(generation) => {
                debug!(generation, "Already connected");
                return Ok(generation);
            }
            Begin::Started { epoch, token } => (epoch, token),
        };
        info!(client_id = %client_id, location = %location, "Connecting");

        let (ready_tx, ready_rx) = oneshot::channel();
        let session = Session {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            epoch,
            token,
        };
        tokio::spawn(session.run(ready_tx));

        ready_rx.await.unwrap_or(Err(RealtimeError::Cancelled))
    }

    /// Connect with an identity value.
    pub async fn connect_as(&self, identity: &ClientIdentity) -> Result<u64, RealtimeError> {
        self.connect(&identity.client_id, &identity.location).await
    }

    /// Close the connection and forget every subscription. Never fails.
    pub fn disconnect(&self) {
        let previous = self.shared.end();
        let cleared = self.shared.registry.clear();
        if previous == ConnectionState::Disconnected {
            debug!("Disconnect while already disconnected");
            return;
        }
        info!(cleared, "Disconnected");
        self.shared.emit(ConnectionEvent::Disconnected);
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        self.shared.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn generation(&self) -> u64 {
        self.shared.generation()
    }

    /// Latest connected generation, 0 before the first connect. Unlike the
    /// bounded event stream this never loses a connect, it only coalesces.
    pub fn watch_generation(&self) -> watch::Receiver<u64> {
        self.shared.watch_generations()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------------

    /// Tell the server this client moved to `location`.
    ///
    /// Returns `false` without sending when not connected. The local
    /// location changes only once the server publishes fresh counts.
    pub fn update_location(&self, location: &str) -> bool {
        let Some(outbound) = self.shared.request_location(location) else {
            info!(location = %location, "Not connected, location update skipped");
            return false;
        };
        let update = LocationUpdate {
            location: location.to_string(),
        };
        let body = match serde_json::to_string(&update) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode location update");
                return false;
            }
        };
        debug!(location = %location, "Location update sent");
        send_frame(&outbound, Frame::send(destinations::LOCATION_UPDATE, body))
    }

    /// Subscribe to aggregate presence counts.
    ///
    /// Publications that do not parse as counts are dropped.
    pub fn subscribe_presence<F>(&self, listener: F) -> Option<SubscriptionHandle>
    where
        F: Fn(PresenceState) + Send + Sync + 'static,
    {
        self.subscribe(destinations::PRESENCE_COUNTS, move |delivery: Delivery| {
            match PresenceState::from_payload(&delivery.payload, &delivery.topic) {
                Some(state) => listener(state),
                None => debug!(payload = %delivery.payload.text(), "Unusable presence payload"),
            }
        })
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Route frames on `topic` to `listener`, replacing any earlier listener.
    ///
    /// Returns `None` when not connected; nothing is queued.
    pub fn subscribe<F>(&self, topic: &str, listener: F) -> Option<SubscriptionHandle>
    where
        F: Fn(Delivery) + Send + Sync + 'static,
    {
        let Some((generation, outbound)) = self.shared.connected_outbound() else {
            debug!(topic = %topic, "Not connected, subscribe refused");
            return None;
        };

        let (handle, replaced) = self
            .shared
            .registry
            .insert(topic, Arc::new(listener), generation);
        // The server already knows the topic only if this link subscribed to it.
        if replaced != Some(generation) {
            send_frame(&outbound, Frame::subscribe(topic));
        }
        debug!(topic = %topic, generation, "Subscribed");
        Some(handle)
    }

    /// Drop the listener for `topic`. Returns whether one was registered.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        if !self.shared.registry.remove(topic) {
            return false;
        }
        if let Some((_, outbound)) = self.shared.connected_outbound() {
            send_frame(&outbound, Frame::unsubscribe(topic));
        }
        debug!(topic = %topic, "Unsubscribed");
        true
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.shared.registry.contains(topic)
    }

    /// Topics with a live listener, sorted.
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.shared.registry.topics()
    }
}

/// Queue `frame` without waiting. Returns whether it was queued.
fn send_frame(outbound: &mpsc::Sender<String>, frame: Frame) -> bool {
    let text = match frame.encode() {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode frame");
            return false;
        }
    };
    match outbound.try_send(text) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, command = ?frame.command, "Frame not sent");
            false
        }
    }
}
