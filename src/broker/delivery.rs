//! Confirmation handles
//!
//! Every subscriber invoked by a publish gets its own `Delivery`, but all
//! deliveries of one publish point at the same queue entry. The first ack
//! from any of them removes the entry for everyone; later acks find nothing
//! to remove and report [`AckOutcome::AlreadyRemoved`].
//!
//! A `Delivery` only holds a weak reference to the broker state. Keeping one
//! around after the broker is gone is harmless; acking it is a no-op.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::broker::registry::Registry;
use crate::broker::subscriber::SubscriptionId;
use crate::broker::topic::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The entry was in the queue and has been removed.
    Removed,
    /// The entry was removed earlier; nothing changed.
    AlreadyRemoved,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    topic: Arc<str>,
    entry_id: EntryId,
    subscription_id: SubscriptionId,
    registry: Weak<Mutex<Registry>>,
}

impl Delivery {
    pub(crate) fn new(
        topic: Arc<str>,
        entry_id: EntryId,
        subscription_id: SubscriptionId,
        registry: Weak<Mutex<Registry>>,
    ) -> Self {
        Self {
            topic,
            entry_id,
            subscription_id,
            registry,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Confirm processing and drop the entry from the topic queue.
    pub fn ack(&self) -> AckOutcome {
        let Some(registry) = self.registry.upgrade() else {
            warn!(
                topic = %self.topic,
                entry = %self.entry_id,
                "ACK after broker shutdown; nothing to remove"
            );
            return AckOutcome::AlreadyRemoved;
        };

        let mut registry = registry.lock();
        if registry.remove_entry(&self.topic, self.entry_id).is_some() {
            registry.stats.acked += 1;
            info!(
                topic = %self.topic,
                entry = %self.entry_id,
                subscription = %self.subscription_id,
                "ACK received; removed entry from queue"
            );
            AckOutcome::Removed
        } else {
            registry.stats.duplicate_acks += 1;
            warn!(
                topic = %self.topic,
                entry = %self.entry_id,
                subscription = %self.subscription_id,
                "ACK for an entry that was already acknowledged and removed"
            );
            AckOutcome::AlreadyRemoved
        }
    }

    /// Report that processing failed. The entry stays queued; no redelivery
    /// is scheduled.
    pub fn nack(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().stats.nacked += 1;
        }
        info!(
            topic = %self.topic,
            entry = %self.entry_id,
            subscription = %self.subscription_id,
            "NACK received; entry remains in queue"
        );
    }
}
