pub mod delivery;
pub mod engine;
pub mod message;
pub mod registry;
pub mod subscriber;
pub mod topic;

pub use delivery::{AckOutcome, Delivery};
pub use engine::{Broker, PublishReceipt};
pub use message::Message;
pub use registry::BrokerStats;
pub use subscriber::{HandlerResult, Subscriber, Subscription, SubscriptionId};
pub use topic::{EntryId, QueueEntry, Topic};
