//! Shared connection state.
//!
//! One mutex guards state, generation, and epoch. It is never held across
//! an `.await`. The background session only writes while its epoch is
//! current; `disconnect` bumps the epoch, which turns any in-flight session
//! work into a no-op.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{ConnectionEvent, ConnectionState, ConnectionStatus};
use crate::protocol::Registration;
use crate::registry::SubscriptionRegistry;

#[derive(Default)]
struct ConnectionCell {
    state: ConnectionState,
    generation: u64,
    epoch: u64,
    client_id: Option<String>,
    location: Option<String>,
    /// Sent in a location update but not yet confirmed by the server.
    requested_location: Option<String>,
    last_heartbeat_in: Option<Instant>,
    last_heartbeat_out: Option<Instant>,
    outbound: Option<mpsc::Sender<String>>,
    session: Option<CancellationToken>,
}

/// Outcome of starting a connect call.
pub(crate) enum Begin {
    AlreadyConnected(u64),
    Started {
        epoch: u64,
        token: CancellationToken,
    },
}

pub(crate) struct Shared {
    cell: Mutex<ConnectionCell>,
    pub(crate) registry: SubscriptionRegistry,
    events: mpsc::Sender<ConnectionEvent>,
    /// Latest connected generation. Coalesces, never drops.
    generations: watch::Sender<u64>,
    /// Parent of every session token; cancelled when the last client handle drops.
    pub(crate) root: CancellationToken,
}

impl Shared {
    pub(crate) fn new(events: mpsc::Sender<ConnectionEvent>) -> Self {
        Self {
            cell: Mutex::new(ConnectionCell::default()),
            registry: SubscriptionRegistry::new(),
            events,
            generations: watch::Sender::new(0),
            root: CancellationToken::new(),
        }
    }

    fn cell(&self) -> MutexGuard<'_, ConnectionCell> {
        self.cell.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish an event without ever waiting on a slow consumer.
    pub(crate) fn emit(&self, event: ConnectionEvent) {
        if let Err(e) = self.events.try_send(event) {
            debug!(error = %e, "Connection event dropped");
        }
    }

    /// Announce a new generation on the watch and the event stream.
    pub(crate) fn announce_connected(&self, generation: u64) {
        self.generations.send_replace(generation);
        self.emit(ConnectionEvent::Connected { generation });
    }

    pub(crate) fn watch_generations(&self) -> watch::Receiver<u64> {
        self.generations.subscribe()
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.cell().state
    }

    pub(crate) fn generation(&self) -> u64 {
        self.cell().generation
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        let cell = self.cell();
        ConnectionStatus {
            state: cell.state,
            generation: cell.generation,
            client_id: cell.client_id.clone(),
            location: cell.location.clone(),
            last_heartbeat_in: cell.last_heartbeat_in,
            last_heartbeat_out: cell.last_heartbeat_out,
        }
    }

    /// Claim a new epoch for a connect call, superseding any running session.
    pub(crate) fn begin(&self, client_id: &str, location: &str) -> Begin {
        let mut cell = self.cell();
        if cell.state == ConnectionState::Connected {
            return Begin::AlreadyConnected(cell.generation);
        }
        if let Some(previous) = cell.session.take() {
            previous.cancel();
        }

        let token = self.root.child_token();
        cell.epoch += 1;
        cell.state = ConnectionState::Connecting;
        cell.client_id = Some(client_id.to_string());
        cell.location = Some(location.to_string());
        cell.requested_location = None;
        cell.outbound = None;
        cell.session = Some(token.clone());

        Begin::Started {
            epoch: cell.epoch,
            token,
        }
    }

    /// Invalidate the current epoch and return the state it left.
    pub(crate) fn end(&self) -> ConnectionState {
        let mut cell = self.cell();
        if let Some(session) = cell.session.take() {
            session.cancel();
        }
        let previous = cell.state;
        cell.epoch += 1;
        cell.state = ConnectionState::Disconnected;
        cell.outbound = None;
        cell.requested_location = None;
        cell.last_heartbeat_in = None;
        cell.last_heartbeat_out = None;
        previous
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.cell().epoch == epoch
    }

    /// Set `state` if `epoch` still owns the connection.
    pub(crate) fn transition(&self, epoch: u64, state: ConnectionState) -> bool {
        let mut cell = self.cell();
        if cell.epoch != epoch {
            return false;
        }
        cell.state = state;
        if state != ConnectionState::Connected {
            cell.outbound = None;
        }
        true
    }

    /// Start a new generation. Returns it, or `None` if the epoch is stale.
    pub(crate) fn mark_connected(
        &self,
        epoch: u64,
        outbound: mpsc::Sender<String>,
    ) -> Option<u64> {
        let mut cell = self.cell();
        if cell.epoch != epoch {
            return None;
        }
        cell.generation += 1;
        cell.state = ConnectionState::Connected;
        cell.outbound = Some(outbound);
        cell.last_heartbeat_in = Some(Instant::now());
        if let Some(location) = cell.requested_location.take() {
            // Re-registration carried it, so the server has it now.
            cell.location = Some(location);
        }
        Some(cell.generation)
    }

    /// Identity to announce when (re)registering.
    pub(crate) fn registration(&self) -> Option<Registration> {
        let cell = self.cell();
        let client_id = cell.client_id.clone()?;
        let location = cell
            .requested_location
            .clone()
            .or_else(|| cell.location.clone())?;
        Some(Registration {
            client_id,
            location,
        })
    }

    pub(crate) fn touch_in(&self, epoch: u64) {
        let mut cell = self.cell();
        if cell.epoch == epoch {
            cell.last_heartbeat_in = Some(Instant::now());
        }
    }

    pub(crate) fn touch_out(&self, epoch: u64) {
        let mut cell = self.cell();
        if cell.epoch == epoch {
            cell.last_heartbeat_out = Some(Instant::now());
        }
    }

    /// A presence publication arrived: a pending location update is now authoritative.
    pub(crate) fn confirm_location(&self, epoch: u64) {
        let mut cell = self.cell();
        if cell.epoch != epoch {
            return;
        }
        if let Some(location) = cell.requested_location.take() {
            debug!(location = %location, "Location confirmed by presence update");
            cell.location = Some(location);
        }
    }

    /// Outbound sender and generation, only while Connected.
    pub(crate) fn connected_outbound(&self) -> Option<(u64, mpsc::Sender<String>)> {
        let cell = self.cell();
        if cell.state != ConnectionState::Connected {
            return None;
        }
        cell.outbound
            .clone()
            .map(|outbound| (cell.generation, outbound))
    }

    /// Record a requested location and return the sender to publish it on.
    pub(crate) fn request_location(&self, location: &str) -> Option<mpsc::Sender<String>> {
        let mut cell = self.cell();
        if cell.state != ConnectionState::Connected {
            return None;
        }
        let outbound = cell.outbound.clone()?;
        cell.requested_location = Some(location.to_string());
        Some(outbound)
    }
}
