//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - managing topics and their ordered subscriber lists
//! - encoding published messages and queueing the wire form per topic
//! - delivering each publish to every subscriber with a confirmation handle
//! - removing queued entries on ack and leaving them in place on nack
//!
//! Concurrency and usage notes:
//! - `Broker` is a cheap, cloneable handle; clones share the same topics.
//! - Delivery is synchronous: `publish` returns only after every
//!   subscriber of the topic has been called.
//! - The registry lock is never held while a subscriber runs, so handlers
//!   may ack, nack, query the broker or publish again from inside the
//!   callback. Creating the queue entry and snapshotting the subscriber list
//!   happen in one critical section, so concurrent publishes to a topic each
//!   get their own entry; no lock is held across delivery, so handlers on
//!   different threads publishing into each other's topics cannot deadlock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::broker::delivery::Delivery;
use crate::broker::message::Message;
use crate::broker::registry::{BrokerStats, Registry};
use crate::broker::subscriber::{
    FnSubscriber, HandlerResult, Subscriber, Subscription, SubscriptionId,
};
use crate::broker::topic::{EntryId, QueueEntry};
use crate::codec::XmlCodec;
use crate::config::BrokerSettings;
use crate::utils::error::{EncodingError, PublishError};

/// What a successful publish did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Queue entry created for this publish.
    pub entry_id: EntryId,
    /// Subscribers whose handler returned `Ok`.
    pub delivered: usize,
    /// Subscribers whose handler returned an error or panicked.
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct Broker {
    registry: Arc<Mutex<Registry>>,
    codec: XmlCodec,
    isolate_panics: bool,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            codec: XmlCodec::default(),
            isolate_panics: true,
        }
    }

    /// Build a broker from configuration. Fails only when the configured
    /// root element is not a usable element name.
    pub fn with_settings(settings: &BrokerSettings) -> Result<Self, EncodingError> {
        Ok(Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            codec: XmlCodec::new(settings.root_element.as_str())?,
            isolate_panics: settings.isolate_panics,
        })
    }

    pub fn codec(&self) -> &XmlCodec {
        &self.codec
    }

    /// Subscribe a closure to `topic`. Creates the topic if needed.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Message, &Delivery) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe_handler(topic, Arc::new(FnSubscriber(handler)))
    }

    /// Subscribe an existing [`Subscriber`] to `topic`. The same handler may
    /// be registered several times and is then called once per registration.
    pub fn subscribe_handler(&self, topic: &str, handler: Arc<dyn Subscriber>) -> Subscription {
        let subscription = Subscription {
            id: SubscriptionId::new(),
            topic: topic.to_string(),
            handler,
        };

        self.registry
            .lock()
            .topic_mut(topic)
            .subscribe(subscription.clone());

        info!(topic, subscription = %subscription.id, "subscribed to topic");
        subscription
    }

    /// Publish `message` to `topic`.
    ///
    /// The message is encoded first; an encoding failure is returned without
    /// touching the queue. On success exactly one queue entry is created,
    /// whether or not anyone is subscribed, and every subscriber registered
    /// at this point is called in registration order.
    pub fn publish(&self, topic: &str, message: &Message) -> Result<PublishReceipt, PublishError> {
        let wire = self.codec.encode(message)?;

        let entry = QueueEntry::new(wire);
        let entry_id = entry.id;
        let subscriptions = {
            let mut registry = self.registry.lock();
            registry.stats.published += 1;
            let topic = registry.topic_mut(topic);
            topic.enqueue(entry);
            topic.subscriptions.clone()
        };

        info!(
            topic,
            entry = %entry_id,
            subscribers = subscriptions.len(),
            "message queued; delivering to subscribers"
        );

        let topic_name: Arc<str> = Arc::from(topic);
        let mut receipt = PublishReceipt {
            entry_id,
            delivered: 0,
            failed: 0,
        };

        for subscription in &subscriptions {
            let delivery = Delivery::new(
                Arc::clone(&topic_name),
                entry_id,
                subscription.id,
                Arc::downgrade(&self.registry),
            );

            let delivered = self.deliver(subscription, message, &delivery);

            let mut registry = self.registry.lock();
            if delivered {
                registry.stats.delivered += 1;
                receipt.delivered += 1;
            } else {
                registry.stats.failed_deliveries += 1;
                receipt.failed += 1;
            }
        }

        Ok(receipt)
    }

    /// Publish a loosely-typed payload. Anything but a JSON object is
    /// rejected with [`PublishError::InvalidMessageType`] before any state
    /// changes.
    pub fn publish_json(&self, topic: &str, payload: &Value) -> Result<PublishReceipt, PublishError> {
        let message = Message::from_json(payload).inspect_err(|e| {
            warn!(topic, error = %e, "rejected publish");
        })?;
        self.publish(topic, &message)
    }

    /// Run one handler. Returns whether it completed successfully.
    fn deliver(&self, subscription: &Subscription, message: &Message, delivery: &Delivery) -> bool {
        let call = || subscription.handler.on_message(message, delivery);

        let outcome = if self.isolate_panics {
            match panic::catch_unwind(AssertUnwindSafe(call)) {
                Ok(result) => result,
                Err(payload) => {
                    error!(
                        topic = %subscription.topic,
                        subscription = %subscription.id,
                        panic = panic_message(payload.as_ref()),
                        "subscriber panicked; continuing with remaining subscribers"
                    );
                    return false;
                }
            }
        } else {
            call()
        };

        match outcome {
            Ok(()) => {
                debug!(topic = %subscription.topic, subscription = %subscription.id, "delivered");
                true
            }
            Err(e) => {
                warn!(
                    topic = %subscription.topic,
                    subscription = %subscription.id,
                    error = %e,
                    "subscriber failed to handle message"
                );
                false
            }
        }
    }

    /// Snapshot of the entries still queued for `topic`, oldest first.
    /// Unknown topics have an empty queue.
    pub fn queued(&self, topic: &str) -> Vec<QueueEntry> {
        self.registry
            .lock()
            .topics
            .get(topic)
            .map(|t| t.queue.clone())
            .unwrap_or_default()
    }

    pub fn queue_len(&self, topic: &str) -> usize {
        self.registry
            .lock()
            .topics
            .get(topic)
            .map_or(0, |t| t.queue.len())
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry
            .lock()
            .topics
            .get(topic)
            .map_or(0, |t| t.subscriptions.len())
    }

    /// Names of every topic seen so far, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.lock().topics.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> BrokerStats {
        self.registry.lock().stats
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
