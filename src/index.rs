use crate::{
    topic::{Topic, TopicFilter, TopicParseError},
    trie::FilterTrie,
};
use log::{debug, trace};
use std::{fmt, hash::Hash};

/// String-level façade over [`FilterTrie`]: parses raw filter and topic
/// strings and delegates to the trie. Owned by the caller; a concurrent
/// host is expected to guard it with its own lock.
#[derive(Debug)]
pub struct SubscriptionIndex<S> {
    trie: FilterTrie<S>,
}

impl<S: fmt::Debug + Eq + Hash + Clone> SubscriptionIndex<S> {
    pub fn new() -> Self {
        Self { trie: FilterTrie::new() }
    }

    /// Register `subscriber` under `filter`. Subscribing twice with the
    /// same filter is a no-op.
    pub fn subscribe(&mut self, subscriber: S, filter: &str) -> Result<(), TopicParseError> {
        let topic_filter: TopicFilter = filter.parse()?;

        debug!("Subscribing {:?} to {}", subscriber, filter);
        self.trie.insert(subscriber, &topic_filter);

        Ok(())
    }

    /// Drop the registration of `subscriber` under `filter`. Returns
    /// `Ok(false)` if the subscriber was not registered under exactly
    /// this filter.
    pub fn unsubscribe(&mut self, subscriber: &S, filter: &str) -> Result<bool, TopicParseError> {
        let topic_filter: TopicFilter = filter.parse()?;

        let removed = self.trie.remove(subscriber, &topic_filter);
        debug!("Unsubscribing {:?} from {}, removed: {}", subscriber, filter, removed);

        Ok(removed)
    }

    /// All subscribers whose filter matches `topic`, one entry per
    /// matching filter. A subscriber registered under two filters which
    /// both match the topic appears twice; delivery order is up to the
    /// caller.
    pub fn matches(&self, topic: &str) -> Result<Vec<S>, TopicParseError> {
        let topic: Topic = topic.parse()?;

        let matches = self.trie.matches(&topic);
        trace!("Matched {} subscribers", matches.len());

        Ok(matches)
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

impl<S: fmt::Debug + Eq + Hash + Clone> Default for SubscriptionIndex<S> {
    fn default() -> Self {
        SubscriptionIndex::new()
    }
}
