//! Topic management
//!
//! A `Topic` owns two things: the ordered list of subscriptions and the
//! queue of encoded messages waiting for an ack. Topics are created on the
//! first subscribe or publish that names them and are never removed.
//!
//! Concurrency note: callers must hold the registry lock while touching a
//! `Topic`.

use std::fmt;

use uuid::Uuid;

use crate::broker::subscriber::Subscription;
use crate::codec::EncodedMessage;

/// Identity of one queue entry. Acks remove entries by id, so two entries
/// carrying identical wire text are still told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: EntryId,
    pub wire: EncodedMessage,
    /// Milliseconds since the UNIX epoch at which the entry was queued.
    pub enqueued_at: i64,
}

impl QueueEntry {
    pub(crate) fn new(wire: EncodedMessage) -> Self {
        Self {
            id: EntryId::new(),
            wire,
            enqueued_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug)]
pub struct Topic {
    pub name: String,
    pub subscriptions: Vec<Subscription>,
    pub queue: Vec<QueueEntry>,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscriptions: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Append a subscription. Registering the same handler twice is allowed
    /// and results in two deliveries per publish.
    pub fn subscribe(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn enqueue(&mut self, entry: QueueEntry) {
        self.queue.push(entry);
    }

    /// Remove the entry with `id`. Returns the entry, or `None` when it has
    /// already been removed.
    pub fn remove_entry(&mut self, id: EntryId) -> Option<QueueEntry> {
        let index = self.queue.iter().position(|entry| entry.id == id)?;
        Some(self.queue.remove(index))
    }
}
