//! Fan-out of process output to live log stream subscribers.
//!
//! The hub keeps one unbounded queue per subscriber. `publish` appends to
//! every queue while holding the registry lock, so each subscriber sees
//! messages in publish order and `publish` never waits on a slow reader.
//! Subscribers only see messages published after they joined; there is no
//! history.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use carpark_core::prelude::*;
use carpark_core::LogMessage;

/// Identifies one registered subscriber
pub type SubscriberId = u64;

/// Registry of live subscribers. Only ever touched under the hub's mutex.
#[derive(Default)]
struct SubscriberSet {
    last_id: SubscriberId,
    entries: Vec<(SubscriberId, mpsc::UnboundedSender<LogMessage>)>,
}

impl SubscriberSet {
    fn insert(&mut self, tx: mpsc::UnboundedSender<LogMessage>) -> SubscriberId {
        self.last_id += 1;
        self.entries.push((self.last_id, tx));
        self.last_id
    }

    fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }
}

/// In-memory broadcast hub shared by the command service and log streams.
///
/// Cloning is cheap and every clone refers to the same subscriber set.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    subscribers: Arc<Mutex<SubscriberSet>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty subscriber
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.lock().insert(tx);
        debug!(subscriber = id, "subscriber registered");

        Subscription {
            id,
            rx,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Remove a subscriber. Queued messages are discarded.
    ///
    /// Returns `false` if the subscriber was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().remove(id);
        if removed {
            debug!(subscriber = id, "subscriber removed");
        }
        removed
    }

    /// Append `message` to every subscriber's queue.
    ///
    /// Returns how many subscribers received it. With no subscribers this is a
    /// no-op returning 0.
    pub fn publish(&self, message: LogMessage) -> usize {
        let mut set = self.lock();
        set.entries.retain(|(id, tx)| {
            let delivered = tx.send(message.clone()).is_ok();
            if !delivered {
                debug!(subscriber = *id, "dropping subscriber with closed queue");
            }
            delivered
        });
        set.entries.len()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, SubscriberSet> {
        // No critical section leaves the set half-updated; poisoning is ignored.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Drain handle for one subscriber.
///
/// Not `Clone`: exactly one consumer drains each queue. Dropping the
/// subscription removes it from the hub.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::UnboundedReceiver<LogMessage>,
    subscribers: Weak<Mutex<SubscriberSet>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message.
    ///
    /// Wakes as soon as a message is published. Returns `None` only once the
    /// subscriber was removed from the hub (or the hub itself is gone) and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<LogMessage> {
        self.rx.recv().await
    }

    /// Take the next message if one is already queued
    pub fn try_recv(&mut self) -> Option<LogMessage> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = LogMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(subscribers) = self.subscribers.upgrade() {
            let removed = subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(self.id);
            if removed {
                debug!(subscriber = self.id, "subscriber dropped");
            }
        }
    }
}
