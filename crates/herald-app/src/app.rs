//! Wires the presence client to the notification pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use herald_common::HeraldError;
use herald_config::schema::{ConnectionConfig, HeraldConfig};
use herald_notify::{DeliveryReport, NotificationPipeline, PipelineHandle};
use herald_realtime::{
    ClientIdentity, ConnectionEvent, ConnectionState, PresenceClient, PresenceState,
    RealtimeConfig, Transport,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::cli::Args;

/// Map the TOML connection section onto the connection manager's timings.
pub fn realtime_config(config: &ConnectionConfig) -> RealtimeConfig {
    RealtimeConfig {
        connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        settle: Duration::from_millis(config.settle_ms),
        heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
        missed_heartbeats: config.missed_heartbeats,
        reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        max_reconnect_attempts: config.max_reconnect_attempts,
    }
}

/// Command-line flags win over the config file.
pub fn apply_overrides(config: &mut HeraldConfig, args: &Args) {
    if let Some(url) = &args.url {
        config.connection.url = url.clone();
    }
    if let Some(client_id) = &args.client_id {
        config.presence.client_id = Some(client_id.clone());
    }
    if let Some(location) = &args.location {
        config.presence.location = location.clone();
    }
}

pub struct App {
    client: PresenceClient,
    events: mpsc::Receiver<ConnectionEvent>,
    generations: watch::Receiver<u64>,
    notifications: PipelineHandle,
    reports: mpsc::Receiver<DeliveryReport>,
    identity: ClientIdentity,
    event_topics: Vec<String>,
}

impl App {
    /// Must be called inside a tokio runtime; the pipeline worker is spawned here.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &HeraldConfig,
        pipeline: NotificationPipeline,
    ) -> Self {
        let (client, events) = PresenceClient::new(transport, realtime_config(&config.connection));
        let generations = client.watch_generation();
        let (notifications, reports) = PipelineHandle::spawn(Arc::new(pipeline));
        let identity = ClientIdentity::from_config(
            config.presence.client_id.as_deref(),
            &config.presence.location,
        );
        Self {
            client,
            events,
            generations,
            notifications,
            reports,
            identity,
            event_topics: config.presence.event_topics.clone(),
        }
    }

    pub fn client(&self) -> &PresenceClient {
        &self.client
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn notifications(&self) -> &PipelineHandle {
        &self.notifications
    }

    /// Connect, then serve connection events and delivery reports until
    /// `shutdown` resolves or the connection gives up.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), HeraldError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            client_id = %self.identity.client_id,
            location = %self.identity.location,
            "Connecting"
        );
        let generation = tokio::select! {
            result = self.client.connect_as(&self.identity) => result?,
            () = &mut shutdown => {
                self.client.disconnect();
                return Ok(());
            }
        };
        debug!(generation, "Initial connect resolved");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutting down");
                    self.client.disconnect();
                    return Ok(());
                }
                changed = self.generations.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                    let generation = *self.generations.borrow_and_update();
                    self.subscribe_all(generation);
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Ok(());
                    };
                    if let Some(err) = self.on_event(event) {
                        return Err(err);
                    }
                }
                Some(report) = self.reports.recv() => log_report(&report),
            }
        }
    }

    /// Returns an error once the connection is beyond recovery.
    fn on_event(&self, event: ConnectionEvent) -> Option<HeraldError> {
        match event {
            // Subscribing is driven by the generation watch.
            ConnectionEvent::Connected { generation } => {
                info!(generation, "Connected");
                None
            }
            ConnectionEvent::Reconnecting { attempt, delay } => {
                info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
                None
            }
            ConnectionEvent::Disconnected => {
                info!("Disconnected");
                None
            }
            ConnectionEvent::Error(err) => {
                if self.client.state() == ConnectionState::Failed {
                    error!(error = %err, "Connection failed for good");
                    return Some(err.into());
                }
                warn!(error = %err, "Connection error");
                None
            }
        }
    }

    /// Subscriptions do not survive a reconnect, so every generation
    /// subscribes afresh.
    fn subscribe_all(&self, generation: u64) {
        let presence = self.client.subscribe_presence(log_presence);
        if presence.is_none() {
            warn!(generation, "Presence subscription refused");
        }

        for topic in &self.event_topics {
            match self.client.subscribe(topic, self.notifications.listener()) {
                Some(_) => debug!(generation, topic = %topic, "Subscribed"),
                None => warn!(generation, topic = %topic, "Subscription refused"),
            }
        }
        info!(
            generation,
            topics = self.event_topics.len(),
            "Subscriptions registered"
        );
    }
}

fn log_presence(state: PresenceState) {
    info!(
        total = state.total,
        locations = ?state.by_location,
        "Presence updated"
    );
}

fn log_report(report: &DeliveryReport) {
    if report.suppressed {
        debug!(event_id = %report.event_id, "Notification suppressed by preference");
        return;
    }
    match report.channel {
        Some(channel) => info!(
            event_id = %report.event_id,
            kind = %report.kind,
            channel = ?channel,
            replaced = report.replaced,
            "Notification delivered"
        ),
        None => warn!(
            event_id = %report.event_id,
            kind = %report.kind,
            "No notification channel worked"
        ),
    }
}
