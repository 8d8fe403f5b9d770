//! Subscriber contract
//!
//! A subscriber is handed the published message and a [`Delivery`] bound to
//! the queue entry created for that publish. It is expected to call
//! [`Delivery::ack`] or [`Delivery::nack`] before returning, though the
//! broker does not enforce it: an entry nobody acks simply stays queued.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::broker::delivery::Delivery;
use crate::broker::message::Message;
use crate::utils::error::SubscriberError;

pub type HandlerResult = Result<(), SubscriberError>;

pub trait Subscriber: Send + Sync {
    fn on_message(&self, message: &Message, delivery: &Delivery) -> HandlerResult;
}

/// Adapter letting a plain closure act as a [`Subscriber`].
pub(crate) struct FnSubscriber<F>(pub(crate) F);

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&Message, &Delivery) -> HandlerResult + Send + Sync,
{
    fn on_message(&self, message: &Message, delivery: &Delivery) -> HandlerResult {
        (self.0)(message, delivery)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered handler. Lives as long as the broker; there is no
/// unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub topic: String,
    pub(crate) handler: Arc<dyn Subscriber>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}
