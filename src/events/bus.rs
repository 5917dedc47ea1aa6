//! # Event bus: fan-out of job events to live subscribers.
//!
//! [`EventBus`] keeps one bounded queue per subscriber (a real-time connection)
//! and pushes every broadcast event into all of them.
//!
//! ## Architecture
//! ```text
//! Publishers (worker loops):            Subscribers (one per /ws connection):
//!   worker 1 ──┐                         ┌──► [queue S1] ──► socket 1
//!   worker 2 ──┼──► broadcast(&Event) ───┼──► [queue S2] ──► socket 2
//!   worker N ──┘    serialize once       └──► [queue SN] ──► socket N
//!                   send with timeout each
//! ```
//!
//! ## Rules
//! - **Serialize once**: the JSON payload is shared (`Arc<str>`) by all queues.
//! - **Bounded wait**: each delivery waits at most [`EventBus::timeout`] for queue space;
//!   deliveries to different subscribers run concurrently, so one broadcast costs at most
//!   one timeout regardless of subscriber count.
//! - **Eviction**: a subscriber whose queue stays full past the timeout, or whose
//!   receiving side is gone, is removed as a side effect of the broadcast.
//! - **Never fails**: `broadcast()` has no error path; delivery is best-effort, at-most-once.
//! - **Same order for everyone**: broadcasts are serialized by the subscriber-set lock,
//!   so all subscribers observe identical event sequences.
//! - **No replay**: a subscriber only sees events broadcast after `subscribe()` returned.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tokio::time;

use super::event::Event;

/// Identifier of a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving side of a subscription.
///
/// Dropping it makes the next broadcast evict the subscriber; calling
/// [`EventBus::unsubscribe`] removes it right away.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next JSON-encoded event.
    ///
    /// Returns `None` once the bus has dropped this subscriber and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Returns the next already-queued event, if any.
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

/// Why a subscriber was evicted during a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryFailure {
    Timeout,
    Closed,
}

impl DeliveryFailure {
    fn as_str(self) -> &'static str {
        match self {
            DeliveryFailure::Timeout => "timeout",
            DeliveryFailure::Closed => "closed",
        }
    }
}

/// Set of live subscribers with timeout-bounded broadcast.
pub struct EventBus {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<str>>>>,
    next_id: AtomicU64,
    timeout: Duration,
    buffer: usize,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("timeout", &self.timeout)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates a bus with the given per-delivery timeout and per-subscriber queue size.
    ///
    /// The minimum queue size is 1 (clamped).
    pub fn new(timeout: Duration, buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            timeout,
            buffer: buffer.max(1),
        }
    }

    /// Per-delivery timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registers a new subscriber. It receives every event broadcast after this returns.
    pub async fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);
        let count = {
            let mut subs = self.subscribers.lock().await;
            subs.insert(id, tx);
            subs.len()
        };
        tracing::debug!(subscriber = %id, count, "subscriber registered");
        Subscription { id, rx }
    }

    /// Removes a subscriber. Idempotent.
    pub async fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            tracing::debug!(subscriber = %id, "subscriber removed");
        }
    }

    /// Number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Delivers `event` to every registered subscriber.
    ///
    /// Subscribers that fail or time out are evicted. Never returns an error.
    pub async fn broadcast(&self, event: &Event) {
        let payload: Arc<str> = match event.to_json() {
            Ok(json) => json.into(),
            Err(err) => {
                tracing::error!(job_id = %event.job_id, kind = event.kind.as_str(), %err, "event serialization failed");
                return;
            }
        };

        let mut subs = self.subscribers.lock().await;
        if subs.is_empty() {
            return;
        }

        let timeout = self.timeout;
        let deliveries = subs.iter().map(|(id, tx)| {
            let payload = Arc::clone(&payload);
            async move {
                let outcome = match time::timeout(timeout, tx.send(payload)).await {
                    Ok(Ok(())) => None,
                    Ok(Err(_closed)) => Some(DeliveryFailure::Closed),
                    Err(_elapsed) => Some(DeliveryFailure::Timeout),
                };
                (*id, outcome)
            }
        });
        let results = join_all(deliveries).await;

        for (id, outcome) in results {
            if let Some(reason) = outcome {
                subs.remove(&id);
                tracing::warn!(subscriber = %id, reason = reason.as_str(), "subscriber dropped");
            }
        }
    }
}
