//! Background session: open, register, pump frames, reconnect.

use std::sync::Arc;

use herald_common::RealtimeError;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::state::Shared;
use super::types::{ConnectionEvent, ConnectionState, RealtimeConfig};
use crate::protocol::{destinations, next_ref, Command, Frame};
use crate::registry::DispatchOutcome;
use crate::transport::{Transport, TransportEvent, TransportLink};

/// Why the frame pump stopped.
enum PumpExit {
    Cancelled,
    Lost(RealtimeError),
}

pub(crate) struct Session {
    pub(crate) shared: Arc<Shared>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: RealtimeConfig,
    pub(crate) epoch: u64,
    pub(crate) token: CancellationToken,
}

// ---------------------------------------------------------------------------
// Session Loop
// ---------------------------------------------------------------------------

impl Session {
    /// Run until cancelled, a terminal failure, or reconnect attempts run out.
    ///
    /// `ready` resolves with the outcome of the first attempt.
    pub(crate) async fn run(self, ready: oneshot::Sender<Result<u64, RealtimeError>>) {
        let mut ready = Some(ready);
        let mut failures: u32 = 0;

        loop {
            let attempt = tokio::select! {
                _ = self.token.cancelled() => return,
                attempt = self.establish() => attempt,
            };

            match attempt {
                Ok(link) => {
                    failures = 0;
                    let Some(generation) =
                        self.shared.mark_connected(self.epoch, link.outbound.clone())
                    else {
                        return;
                    };

                    let purged = self.shared.registry.purge_stale(generation);
                    info!(generation, purged, "Connected");
                    self.shared.announce_connected(generation);
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(Ok(generation));
                    }

                    match self.pump(link, generation).await {
                        PumpExit::Cancelled => return,
                        PumpExit::Lost(err) => {
                            if !self.shared.is_current(self.epoch) {
                                return;
                            }
                            warn!(error = %err, generation, "Connection lost");
                            self.shared.emit(ConnectionEvent::Error(err));
                        }
                    }
                }
                Err(err) => {
                    if !self.shared.is_current(self.epoch) {
                        return;
                    }
                    warn!(error = %err, "Connect attempt failed");

                    // A final error is published after the Failed transition.
                    if let Some(tx) = ready.take() {
                        self.shared.transition(self.epoch, ConnectionState::Failed);
                        self.shared.emit(ConnectionEvent::Error(err.clone()));
                        let _ = tx.send(Err(err));
                        return;
                    }

                    failures += 1;
                    let max = self.config.max_reconnect_attempts;
                    if err.is_terminal() || (max != 0 && failures >= max) {
                        warn!(failures, "Giving up on reconnecting");
                        self.shared.transition(self.epoch, ConnectionState::Failed);
                        self.shared.emit(ConnectionEvent::Error(err));
                        return;
                    }
                    self.shared.emit(ConnectionEvent::Error(err));
                }
            }

            if !self
                .shared
                .transition(self.epoch, ConnectionState::Reconnecting)
            {
                return;
            }
            let delay = self.config.reconnect_delay;
            info!(
                delay_ms = delay.as_millis() as u64,
                attempt = failures + 1,
                "Reconnecting in {:?}",
                delay
            );
            self.shared.emit(ConnectionEvent::Reconnecting {
                attempt: failures + 1,
                delay,
            });

            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    /// Open the transport and register.
    ///
    /// Succeeds on an ack carrying the registration ref, or when the settle
    /// window passes in silence.
    async fn establish(&self) -> Result<TransportLink, RealtimeError> {
        let timeout = self.config.connect_timeout;
        let mut link = match tokio::time::timeout(timeout, self.transport.open()).await {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => return Err(e),
            Err(_elapsed) => return Err(RealtimeError::Timeout(timeout.as_millis() as u64)),
        };

        let registration = self
            .shared
            .registration()
            .ok_or(RealtimeError::Cancelled)?;
        let body = serde_json::to_string(&registration)
            .map_err(|e| RealtimeError::Transport(format!("failed to encode registration: {e}")))?;
        let reg_ref = next_ref();
        let frame = Frame::send(destinations::REGISTRATION, body).with_ref(reg_ref.clone());
        let text = frame
            .encode()
            .map_err(|e| RealtimeError::Transport(format!("failed to encode frame: {e}")))?;

        link.outbound
            .send(text)
            .await
            .map_err(|_| RealtimeError::Closed("transport closed before registration".into()))?;
        self.shared.touch_out(self.epoch);
        debug!(client_id = %registration.client_id, location = %registration.location, "Registration sent");

        let deadline = Instant::now() + self.config.settle_window();
        loop {
            let event = match tokio::time::timeout_at(deadline, link.inbound.recv()).await {
                Err(_elapsed) => {
                    debug!("No registration ack within settle window, assuming registered");
                    return Ok(link);
                }
                Ok(None) => {
                    return Err(RealtimeError::Closed(
                        "transport closed during registration".into(),
                    ))
                }
                Ok(Some(event)) => event,
            };

            let text = match event {
                TransportEvent::Frame(text) => text,
                TransportEvent::Closed(reason) => {
                    return Err(RealtimeError::Closed(
                        reason.unwrap_or_else(|| "closed during registration".into()),
                    ))
                }
                TransportEvent::Error(e) => return Err(RealtimeError::Transport(e)),
            };

            let Ok(reply) = Frame::decode(&text) else {
                debug!(text = %text, "Unrecognized frame during registration");
                continue;
            };
            match reply.command {
                Command::Ack if reply.frame_ref.as_deref() == Some(reg_ref.as_str()) => {
                    if !ack_body_is_valid(reply.body.as_deref()) {
                        return Err(RealtimeError::MalformedAck(format!(
                            "unexpected ack body {:?}",
                            reply.body
                        )));
                    }
                    debug!("Registration acknowledged");
                    return Ok(link);
                }
                Command::Ack => {
                    return Err(RealtimeError::MalformedAck(format!(
                        "expected ref {reg_ref}, got {:?}",
                        reply.frame_ref
                    )))
                }
                Command::Error
                    if reply.frame_ref.is_none()
                        || reply.frame_ref.as_deref() == Some(reg_ref.as_str()) =>
                {
                    return Err(RealtimeError::RegistrationRejected(
                        reply.body.unwrap_or_else(|| "rejected".into()),
                    ))
                }
                _ => trace!(command = ?reply.command, "Frame before registration completed, dropped"),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Frame Pump
    // -----------------------------------------------------------------------

    /// Dispatch inbound frames and send heartbeats until the link dies.
    async fn pump(&self, link: TransportLink, generation: u64) -> PumpExit {
        let TransportLink {
            outbound,
            mut inbound,
        } = link;

        let period = self.config.heartbeat_period();
        let window = self.config.liveness_window();
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_inbound = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return PumpExit::Cancelled,
                event = inbound.recv() => match event {
                    Some(TransportEvent::Frame(text)) => {
                        last_inbound = Instant::now();
                        self.shared.touch_in(self.epoch);
                        self.handle_frame(&text, generation);
                    }
                    Some(TransportEvent::Closed(reason)) => {
                        return PumpExit::Lost(RealtimeError::Closed(
                            reason.unwrap_or_else(|| "server closed the connection".into()),
                        ));
                    }
                    Some(TransportEvent::Error(e)) => {
                        return PumpExit::Lost(RealtimeError::Transport(e));
                    }
                    None => {
                        return PumpExit::Lost(RealtimeError::Closed("transport stream ended".into()));
                    }
                },
                _ = heartbeat.tick() => {
                    if last_inbound.elapsed() >= window {
                        return PumpExit::Lost(RealtimeError::HeartbeatTimeout(
                            self.config.missed_heartbeats,
                        ));
                    }
                    let Ok(text) = Frame::heartbeat().encode() else {
                        continue;
                    };
                    match outbound.try_send(text) {
                        Ok(()) => self.shared.touch_out(self.epoch),
                        Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                            debug!("Outbound queue full, heartbeat skipped");
                        }
                        Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                            return PumpExit::Lost(RealtimeError::Closed("outbound closed".into()));
                        }
                    }
                }
            }
        }
    }

    fn handle_frame(&self, text: &str, generation: u64) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "Unparseable frame dropped");
                return;
            }
        };

        match frame.command {
            Command::Heartbeat => trace!("Heartbeat received"),
            Command::Message => {
                let Some(topic) = frame.destination.as_deref() else {
                    debug!("Message without destination dropped");
                    return;
                };
                if topic == destinations::PRESENCE_COUNTS {
                    self.shared.confirm_location(self.epoch);
                }
                let outcome = self.shared.registry.dispatch(
                    topic,
                    frame.body.as_deref().unwrap_or(""),
                    generation,
                    self.shared.generation(),
                );
                if outcome == DispatchOutcome::Delivered {
                    trace!(topic = %topic, "Frame dispatched");
                }
            }
            Command::Error => {
                warn!(
                    reason = %frame.body.as_deref().unwrap_or("unspecified"),
                    "Server reported an error"
                );
            }
            Command::Ack => trace!(frame_ref = ?frame.frame_ref, "Ack received"),
            other => debug!(command = ?other, "Unexpected command from server"),
        }
    }
}

/// An ack may carry no body or a JSON object.
fn ack_body_is_valid(body: Option<&str>) -> bool {
    match body.map(str::trim) {
        None | Some("") => true,
        Some(text) => matches!(
            serde_json::from_str::<serde_json::Value>(text),
            Ok(serde_json::Value::Object(_))
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_bodies() {
        assert!(ack_body_is_valid(None));
        assert!(ack_body_is_valid(Some("")));
        assert!(ack_body_is_valid(Some(r#"{"clientId":"visitor-1"}"#)));
        assert!(!ack_body_is_valid(Some("ok")));
        assert!(!ack_body_is_valid(Some("[1]")));
    }
}
