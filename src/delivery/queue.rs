//! Delivery Queue: built events awaiting transmission.
//!
//! An event in the queue has never been delivered. It leaves the queue the moment
//! a send is dispatched and comes back (same envelope, at the tail) only when that
//! send fails, so it is never present twice.

use crate::event::Event;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;

/// An event plus how many sends have been attempted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: Event,
    pub attempts: u32,
}

impl Envelope {
    pub fn new(event: Event) -> Self {
        Self { event, attempts: 0 }
    }
}

/// Delivery counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Events waiting in the queue
    pub pending: usize,
    /// Sends dispatched whose outcome is not known yet
    pub in_flight: usize,
    /// Successful sends
    pub delivered: usize,
    /// Failed send attempts (each retry counts)
    pub failed_attempts: usize,
    /// Events given up on after reaching the attempt ceiling
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryQueue {
    events: Arc<Mutex<VecDeque<Envelope>>>,
    stats: Arc<RwLock<DeliveryStats>>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly built event.
    pub fn push(&self, event: Event) {
        self.requeue(Envelope::new(event));
    }

    /// Append an envelope whose send failed.
    pub fn requeue(&self, envelope: Envelope) {
        let mut events = self.events.lock();
        events.push_back(envelope);
        self.stats.write().pending = events.len();
    }

    /// One bounded pass: hand the `N` leading envelopes to `dispatch`, where `N`
    /// is the queue length at entry. Anything appended meanwhile waits for the
    /// next cycle. Returns `N`.
    ///
    /// The queue lock is held for the whole pass so concurrent cycles cannot
    /// interleave their hand-offs; `dispatch` must not block or touch the queue.
    pub fn drain_cycle<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(Envelope),
    {
        let mut events = self.events.lock();
        let n = events.len();
        for _ in 0..n {
            let Some(envelope) = events.pop_front() else {
                break;
            };
            {
                let mut stats = self.stats.write();
                stats.in_flight += 1;
                stats.pending = events.len();
            }
            dispatch(envelope);
        }
        n
    }

    /// Put envelopes that were taken by a cycle but never handed to a sender back
    /// at the head, in their original order. No attempt is counted.
    pub(crate) fn restore(&self, envelopes: Vec<Envelope>) {
        let mut events = self.events.lock();
        let restored = envelopes.len();
        for envelope in envelopes.into_iter().rev() {
            events.push_front(envelope);
        }
        let mut stats = self.stats.write();
        stats.in_flight = stats.in_flight.saturating_sub(restored);
        stats.pending = events.len();
    }

    pub(crate) fn record_success(&self) {
        let mut stats = self.stats.write();
        stats.in_flight = stats.in_flight.saturating_sub(1);
        stats.delivered += 1;
    }

    /// Count a failed attempt. The caller either requeues or drops the envelope.
    pub(crate) fn record_failure(&self, dropped: bool) {
        let mut stats = self.stats.write();
        stats.in_flight = stats.in_flight.saturating_sub(1);
        stats.failed_attempts += 1;
        if dropped {
            stats.dropped += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.stats.read().clone()
    }

    /// Event ids in queue order.
    pub fn pending_ids(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|env| env.event.event_id().to_string())
            .collect()
    }
}
