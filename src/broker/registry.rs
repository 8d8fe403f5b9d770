use std::collections::HashMap;

use serde::Serialize;

use crate::broker::topic::{EntryId, QueueEntry, Topic};

/// Running counters for one broker instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    pub published: u64,
    pub delivered: u64,
    pub failed_deliveries: u64,
    pub acked: u64,
    pub duplicate_acks: u64,
    pub nacked: u64,
}

/// Mutable broker state: every topic by name, plus counters.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) topics: HashMap<String, Topic>,
    pub(crate) stats: BrokerStats,
}

impl Registry {
    pub(crate) fn topic_mut(&mut self, name: &str) -> &mut Topic {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| Topic::new(name))
    }

    pub(crate) fn remove_entry(&mut self, topic: &str, id: EntryId) -> Option<QueueEntry> {
        self.topics.get_mut(topic)?.remove_entry(id)
    }
}
