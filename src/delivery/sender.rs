//! Sender: performs one network attempt per dispatched envelope and routes the
//! outcome. Success discards the event; failure requeues the same envelope at
//! the tail of the Delivery Queue for a later cycle.

use crate::delivery::queue::{DeliveryQueue, Envelope};
use crate::delivery::transport::{DeliveryReceipt, Transport};
use crate::error::DeliveryError;
use futures::channel::mpsc::UnboundedReceiver;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub type SuccessCallback = Arc<dyn Fn(&DeliveryReceipt) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&DeliveryError) + Send + Sync>;

/// Delivery settings resolved at init.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub endpoint_url: String,
    /// Upper bound on a single attempt; elapsing counts as a failure.
    pub send_timeout: Duration,
    /// Maximum concurrent attempts.
    pub max_in_flight: usize,
    /// Give up after this many attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
    pub debug: bool,
}

pub struct Sender {
    config: SenderConfig,
    transport: Arc<dyn Transport>,
    queue: DeliveryQueue,
    on_success: SuccessCallback,
    on_error: ErrorCallback,
}

impl Sender {
    pub fn new(
        config: SenderConfig,
        transport: Arc<dyn Transport>,
        queue: DeliveryQueue,
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    ) -> Self {
        Self {
            config,
            transport,
            queue,
            on_success,
            on_error,
        }
    }

    /// Worker loop: attempts are started in hand-off order, up to
    /// `max_in_flight` at a time. Ends when every hand-off channel is closed.
    pub async fn run(self: Arc<Self>, envelopes: UnboundedReceiver<Envelope>) {
        let limit = self.config.max_in_flight.max(1);
        debug!(max_in_flight = limit, "Sender started");
        envelopes
            .map(|envelope| {
                let sender = Arc::clone(&self);
                async move { sender.send(envelope).await }
            })
            .buffer_unordered(limit)
            .for_each(|_| async {})
            .await;
        debug!("Sender stopped");
    }

    /// One attempt for one envelope.
    pub async fn send(&self, mut envelope: Envelope) {
        envelope.attempts += 1;
        let start = Instant::now();
        debug!(
            event_id = %envelope.event.event_id(),
            event_type = %envelope.event.event_type(),
            attempt = envelope.attempts,
            "Sending event"
        );

        let outcome = match tokio::time::timeout(
            self.config.send_timeout,
            self.transport.post(&self.config.endpoint_url, &envelope.event),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.config.send_timeout)),
        };

        match outcome {
            Ok(receipt) => {
                (self.on_success)(&receipt);
                self.queue.record_success();
                debug!(
                    event_id = %envelope.event.event_id(),
                    status = receipt.status,
                    attempt = envelope.attempts,
                    duration_ms = start.elapsed().as_millis(),
                    "Event sent"
                );
            }
            Err(err) => self.fail(envelope, err),
        }
    }

    fn fail(&self, envelope: Envelope, err: DeliveryError) {
        let exhausted = self
            .config
            .max_attempts
            .is_some_and(|max| envelope.attempts >= max);
        (self.on_error)(&err);

        if exhausted {
            self.queue.record_failure(true);
            if self.config.debug {
                warn!(
                    event_id = %envelope.event.event_id(),
                    attempts = envelope.attempts,
                    error = %err,
                    "Event dropped after reaching attempt ceiling"
                );
            }
            return;
        }

        if self.config.debug {
            error!(
                event_id = %envelope.event.event_id(),
                attempt = envelope.attempts,
                error = %err,
                "Event failed"
            );
        }
        // Requeue before releasing the in-flight slot so the event is never
        // invisible to `stats()`.
        self.queue.requeue(envelope);
        self.queue.record_failure(false);
    }
}
