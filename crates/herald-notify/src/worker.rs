//! Worker task that runs the pipeline off the connection's receive loop.

use std::sync::Arc;

use herald_realtime::Delivery;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::DomainEvent;
use crate::pipeline::{DeliveryReport, NotificationPipeline};

const QUEUE_CAPACITY: usize = 256;

/// Sender side of the pipeline worker. Cheap to clone.
///
/// The worker handles events one at a time, in the order they were
/// submitted, and stops once every handle is dropped.
#[derive(Clone)]
pub struct PipelineHandle {
    events: mpsc::Sender<DomainEvent>,
    pipeline: Arc<NotificationPipeline>,
}

impl PipelineHandle {
    /// Spawn the worker. Reports for handled events arrive on the receiver;
    /// they are dropped when it is full or gone.
    pub fn spawn(pipeline: Arc<NotificationPipeline>) -> (Self, mpsc::Receiver<DeliveryReport>) {
        let (events_tx, mut events_rx) = mpsc::channel::<DomainEvent>(QUEUE_CAPACITY);
        let (reports_tx, reports_rx) = mpsc::channel(QUEUE_CAPACITY);

        let worker_pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let report = worker_pipeline.handle(event).await;
                if let Err(e) = reports_tx.try_send(report) {
                    debug!(error = %e, "Delivery report dropped");
                }
            }
            info!("Notification worker stopped");
        });

        (
            Self {
                events: events_tx,
                pipeline,
            },
            reports_rx,
        )
    }

    /// Queue an event without waiting. Returns `false` if it was dropped.
    pub fn submit(&self, event: DomainEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(event_id = %event.id, "Notification queue full, event dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(event_id = %event.id, "Notification worker gone, event dropped");
                false
            }
        }
    }

    /// Subscription listener that classifies each delivery and queues it.
    pub fn listener(&self) -> impl Fn(Delivery) + Send + Sync + 'static {
        let handle = self.clone();
        move |delivery| {
            handle.submit(DomainEvent::from_delivery(delivery));
        }
    }

    pub fn pipeline(&self) -> &Arc<NotificationPipeline> {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::event::EventKind;
    use crate::pipeline::PipelineSettings;
    use crate::testing::{RecordingAudio, RecordingHaptics, RecordingNotifier};
    use herald_realtime::Payload;

    fn spawn() -> (PipelineHandle, mpsc::Receiver<DeliveryReport>) {
        let pipeline = NotificationPipeline::new(
            Arc::new(RecordingNotifier::granted()),
            Arc::new(RecordingAudio::default()),
            Arc::new(RecordingHaptics::supported()),
            PipelineSettings::default(),
        );
        PipelineHandle::spawn(Arc::new(pipeline))
    }

    fn delivery(body: &str) -> Delivery {
        Delivery {
            topic: "topic-backups".into(),
            payload: Payload::decode(body),
            generation: 1,
        }
    }

    #[tokio::test]
    async fn listener_feeds_worker_in_order() {
        let (handle, mut reports) = spawn();
        let listener = handle.listener();

        listener(delivery(r#"{"id":"1","message":"Backup completado exitosamente"}"#));
        listener(delivery(r#"{"id":"2","message":"Backup fallido"}"#));
        listener(delivery(r#"{"id":"3","message":"Nightly backup scheduled"}"#));

        let first = reports.recv().await.unwrap();
        let second = reports.recv().await.unwrap();
        let third = reports.recv().await.unwrap();
        assert_eq!(first.event_id.as_str(), "1");
        assert_eq!(first.kind, EventKind::Success);
        assert_eq!(second.event_id.as_str(), "2");
        assert_eq!(second.kind, EventKind::Error);
        assert_eq!(third.event_id.as_str(), "3");
        assert_eq!(third.kind, EventKind::Info);
        assert_eq!(third.channel, Some(Channel::Foreground));
    }

    #[tokio::test]
    async fn worker_runs_without_a_report_reader() {
        let (handle, reports) = spawn();
        drop(reports);
        assert!(handle.submit(DomainEvent::new(Payload::decode("hello"), "topic-x")));

        let pipeline = Arc::clone(handle.pipeline());
        tokio::time::timeout(std::time::Duration::from_secs(1), async move {
            while pipeline.visible().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
