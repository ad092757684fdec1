use crate::topic::{Topic, TopicFilter, TopicLevel};
use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    hash::Hash,
};

/// One level of the filter tree. A node owns the child node for every
/// concrete next level, an optional child for the single-level wildcard,
/// and the sets of subscribers whose filter terminates here.
///
/// A multi-level wildcard is always the last level of a filter, so its
/// subscribers are stored inline instead of in a child node of their own.
#[derive(Debug)]
struct TrieNode<S> {
    subscribers: HashSet<S>,
    multi_level_subscribers: HashSet<S>,
    single_level_wildcard: Option<Box<TrieNode<S>>>,
    children: HashMap<String, TrieNode<S>>,
}

/// A token-indexed tree of topic filters, mapping a published topic to
/// every subscriber whose filter matches it.
///
/// Nodes are created lazily on insert and pruned eagerly on remove: a
/// non-root node with no subscribers and no children is deleted in the
/// same traversal that emptied it, so the tree always holds exactly the
/// union of the currently registered filter paths.
#[derive(Debug)]
pub struct FilterTrie<S> {
    root: TrieNode<S>,
}

impl<S: Eq + Hash> FilterTrie<S> {
    pub fn new() -> Self {
        Self { root: TrieNode::new() }
    }

    /// Register `subscriber` under `filter`. Registering the same
    /// (subscriber, filter) pair twice is a no-op.
    pub fn insert(&mut self, subscriber: S, filter: &TopicFilter) {
        self.root.insert(subscriber, filter);
    }

    /// Remove the registration of `subscriber` under `filter`, pruning
    /// any levels left without subscribers or children on the way back
    /// up. Returns false if the subscriber was not registered under
    /// exactly this filter.
    pub fn remove(&mut self, subscriber: &S, filter: &TopicFilter) -> bool {
        let levels: Vec<TopicLevel> = filter.levels().collect();
        self.root.remove(subscriber, &levels)
    }

    /// Call `sub_fn` once per (subscriber, matching filter) pair. A
    /// subscriber registered under several filters which all match the
    /// topic is reported once per filter.
    pub fn matching_subscribers<F: FnMut(&S)>(&self, topic: &Topic, mut sub_fn: F) {
        let levels: Vec<TopicLevel> = topic.levels().collect();
        let mut tree_stack: Vec<(&TrieNode<S>, usize)> = vec![(&self.root, 0)];

        while let Some((node, level_index)) = tree_stack.pop() {
            // A multi-level wildcard child absorbs the rest of the
            // topic, including zero remaining levels.
            for subscriber in &node.multi_level_subscribers {
                sub_fn(subscriber);
            }

            if level_index == levels.len() {
                for subscriber in &node.subscribers {
                    sub_fn(subscriber);
                }

                continue;
            }

            // The single-level wildcard branch and the concrete branch
            // are explored independently, neither cuts off the other.
            if let Some(child) = &node.single_level_wildcard {
                tree_stack.push((child, level_index + 1));
            }

            if let TopicLevel::Concrete(level) = &levels[level_index] {
                if let Some(child) = node.children.get(*level) {
                    tree_stack.push((child, level_index + 1));
                }
            }
        }
    }

    /// Collect the matching subscribers into a list. Duplicates across
    /// distinct matching filters are kept; the order is unspecified.
    pub fn matches(&self, topic: &Topic) -> Vec<S>
    where
        S: Clone,
    {
        let mut matches = Vec::new();
        self.matching_subscribers(topic, |subscriber| matches.push(subscriber.clone()));
        matches
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of levels currently stored, not counting the root.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

impl<S: Eq + Hash> Default for FilterTrie<S> {
    fn default() -> Self {
        FilterTrie::new()
    }
}

impl<S: Eq + Hash> TrieNode<S> {
    fn new() -> Self {
        Self {
            subscribers: HashSet::new(),
            multi_level_subscribers: HashSet::new(),
            single_level_wildcard: None,
            children: HashMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
            && self.multi_level_subscribers.is_empty()
            && self.single_level_wildcard.is_none()
            && self.children.is_empty()
    }

    fn node_count(&self) -> usize {
        let wildcard_nodes = match &self.single_level_wildcard {
            Some(child) => 1 + child.node_count(),
            None => 0,
        };

        let concrete_nodes: usize =
            self.children.values().map(|child| 1 + child.node_count()).sum();

        wildcard_nodes + concrete_nodes
    }

    fn insert(&mut self, subscriber: S, filter: &TopicFilter) {
        let mut current = self;

        for level in filter.levels() {
            match level {
                TopicLevel::SingleLevelWildcard => {
                    let child: &mut TrieNode<S> = current
                        .single_level_wildcard
                        .get_or_insert_with(|| Box::new(TrieNode::new()));
                    current = child;
                },
                TopicLevel::MultiLevelWildcard => {
                    // Validated to be the last level of the filter.
                    current.multi_level_subscribers.insert(subscriber);
                    return;
                },
                TopicLevel::Concrete(concrete_level) => {
                    current = current
                        .children
                        .entry(concrete_level.to_string())
                        .or_insert_with(TrieNode::new);
                },
            }
        }

        current.subscribers.insert(subscriber);
    }

    fn remove(&mut self, subscriber: &S, levels: &[TopicLevel]) -> bool {
        let (level, rest) = match levels.split_first() {
            Some(split) => split,
            None => return self.subscribers.remove(subscriber),
        };

        match level {
            TopicLevel::SingleLevelWildcard => {
                let removed = match self.single_level_wildcard.as_mut() {
                    Some(child) => child.remove(subscriber, rest),
                    None => return false,
                };

                if removed
                    && self
                        .single_level_wildcard
                        .as_ref()
                        .map(|child| child.is_empty())
                        .unwrap_or(false)
                {
                    self.single_level_wildcard = None;
                }

                removed
            },
            TopicLevel::MultiLevelWildcard => self.multi_level_subscribers.remove(subscriber),
            TopicLevel::Concrete(concrete_level) => {
                let removed = match self.children.get_mut(*concrete_level) {
                    Some(child) => child.remove(subscriber, rest),
                    None => return false,
                };

                if removed {
                    if let Entry::Occupied(entry) =
                        self.children.entry((*concrete_level).to_string())
                    {
                        if entry.get().is_empty() {
                            entry.remove_entry();
                        }
                    }
                }

                removed
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::trie::FilterTrie;
    use std::{collections::HashSet, iter::FromIterator};

    fn assert_subscribers(trie: &FilterTrie<u32>, topic: &str, numbers: &[u32]) {
        let expected_set: HashSet<u32> = HashSet::from_iter(numbers.iter().cloned());
        let actual_set: HashSet<u32> = trie.matches(&topic.parse().unwrap()).into_iter().collect();

        assert_eq!(expected_set, actual_set, "topic: {}", topic);
    }

    #[test]
    fn test_insert_and_match() {
        let mut trie = FilterTrie::new();
        trie.insert(1, &"home/kitchen/temperature".parse().unwrap());
        trie.insert(2, &"home/kitchen/humidity".parse().unwrap());
        trie.insert(3, &"home/kitchen".parse().unwrap());
        trie.insert(4, &"home/+/humidity".parse().unwrap());
        trie.insert(5, &"home/+".parse().unwrap());
        trie.insert(6, &"home/#".parse().unwrap());
        trie.insert(7, &"home/+/temperature".parse().unwrap());
        trie.insert(8, &"office/stairwell/temperature".parse().unwrap());
        trie.insert(9, &"office/+/+".parse().unwrap());
        trie.insert(10, &"office/+/+/some_desk/+/fan_speed/+/temperature".parse().unwrap());
        trie.insert(11, &"office/+/+/some_desk/+/#".parse().unwrap());
        trie.insert(21, &"sport/tennis/+".parse().unwrap());
        trie.insert(12, &"#".parse().unwrap());

        assert_subscribers(&trie, "home", &[6, 12]);
        assert_subscribers(&trie, "home/kitchen", &[3, 5, 6, 12]);
        assert_subscribers(&trie, "home/kitchen/humidity", &[2, 4, 6, 12]);
        assert_subscribers(&trie, "home/kitchen/temperature", &[1, 6, 7, 12]);
        assert_subscribers(&trie, "office/stairwell/temperature", &[8, 9, 12]);
        assert_subscribers(
            &trie,
            "office/tokyo/shibuya/some_desk/cpu_1/fan_speed/blade_4/temperature",
            &[10, 11, 12],
        );
        assert_subscribers(&trie, "sport/tennis/player1", &[21, 12]);
        assert_subscribers(&trie, "sport/tennis/player2", &[21, 12]);
        assert_subscribers(&trie, "sport/tennis/player1/ranking", &[12]);
    }

    #[test]
    fn test_multi_level_wildcard_absorbs_zero_or_more_levels() {
        let mut trie = FilterTrie::new();
        trie.insert("sub", &"a/#".parse().unwrap());

        assert_subscribers_str(&trie, "a", &["sub"]);
        assert_subscribers_str(&trie, "a/b", &["sub"]);
        assert_subscribers_str(&trie, "a/b/c", &["sub"]);
        assert_subscribers_str(&trie, "b", &[]);
    }

    #[test]
    fn test_single_level_wildcard_matches_exactly_one_level() {
        let mut trie = FilterTrie::new();
        trie.insert("sub", &"a/+/c".parse().unwrap());

        assert_subscribers_str(&trie, "a/x/c", &["sub"]);
        assert_subscribers_str(&trie, "a/y/c", &["sub"]);
        assert_subscribers_str(&trie, "a/x/y/c", &[]);
        assert_subscribers_str(&trie, "a/c", &[]);
    }

    #[test]
    fn test_empty_levels_are_distinct_tokens() {
        let mut trie = FilterTrie::new();
        trie.insert("slash", &"/".parse().unwrap());
        trie.insert("inner", &"a//b".parse().unwrap());

        assert_subscribers_str(&trie, "/", &["slash"]);
        assert_subscribers_str(&trie, "a//b", &["inner"]);
        assert_subscribers_str(&trie, "a/b", &[]);

        // root -> "" -> "" plus root -> "a" -> "" -> "b"
        assert_eq!(trie.node_count(), 5);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut trie = FilterTrie::new();
        trie.insert("sub", &"a/b".parse().unwrap());
        trie.insert("sub", &"a/b".parse().unwrap());

        assert_eq!(trie.matches(&"a/b".parse().unwrap()), vec!["sub"]);
        assert_eq!(trie.node_count(), 2);

        assert!(trie.remove(&"sub", &"a/b".parse().unwrap()));
        assert!(!trie.remove(&"sub", &"a/b".parse().unwrap()));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_duplicates_are_reported_per_matching_filter() {
        let mut trie = FilterTrie::new();
        trie.insert("sub", &"a/#".parse().unwrap());
        trie.insert("sub", &"a/+".parse().unwrap());

        let mut matches = trie.matches(&"a/b".parse().unwrap());
        matches.sort();

        assert_eq!(matches, vec!["sub", "sub"]);
    }

    #[test]
    fn test_two_subscribers_same_filter() {
        let mut trie = FilterTrie::new();
        trie.insert("sub_a", &"a/b".parse().unwrap());
        trie.insert("sub_b", &"a/b".parse().unwrap());

        let mut matches = trie.matches(&"a/b".parse().unwrap());
        matches.sort();

        assert_eq!(matches, vec!["sub_a", "sub_b"]);
    }

    #[test]
    fn test_remove_prunes_empty_branches() {
        let mut trie = FilterTrie::new();
        trie.insert("S1", &"a/b/d".parse().unwrap());
        trie.insert("S2", &"a/c".parse().unwrap());

        assert_eq!(trie.node_count(), 4);
        assert_subscribers_str(&trie, "a/b/d", &["S1"]);
        assert_subscribers_str(&trie, "a/c", &["S2"]);
        assert_subscribers_str(&trie, "a/b", &[]);

        // Dropping S1 prunes b and d; a survives because it still
        // leads to c.
        assert!(trie.remove(&"S1", &"a/b/d".parse().unwrap()));
        assert_subscribers_str(&trie, "a/b/d", &[]);
        assert_subscribers_str(&trie, "a/c", &["S2"]);
        assert_eq!(trie.node_count(), 2);

        assert!(trie.remove(&"S2", &"a/c".parse().unwrap()));
        assert_eq!(trie.node_count(), 0);
        assert!(trie.is_empty());
    }

    #[test]
    fn test_remove_missing_path_is_not_found() {
        let mut trie = FilterTrie::new();
        trie.insert("sub", &"a/b".parse().unwrap());

        assert!(!trie.remove(&"sub", &"a/x".parse().unwrap()));
        assert!(!trie.remove(&"sub", &"a/b/c".parse().unwrap()));
        assert!(!trie.remove(&"other", &"a/b".parse().unwrap()));
        assert!(!trie.remove(&"sub", &"a/+".parse().unwrap()));
        assert!(!trie.remove(&"sub", &"a/#".parse().unwrap()));

        // Failed removals leave the tree untouched
        assert_eq!(trie.node_count(), 2);
        assert_subscribers_str(&trie, "a/b", &["sub"]);
    }

    #[test]
    fn test_remove_wildcard_filters() {
        let mut trie = FilterTrie::new();
        trie.insert("sub_1", &"home/kitchen/temperature".parse().unwrap());
        trie.insert("sub_2", &"home/kitchen/temperature".parse().unwrap());
        trie.insert("sub_3", &"home/kitchen/humidity".parse().unwrap());
        trie.insert("sub_4", &"home/kitchen/#".parse().unwrap());
        trie.insert("sub_5", &"home/kitchen/+".parse().unwrap());
        trie.insert("sub_6", &"home/kitchen/+".parse().unwrap());
        trie.insert("sub_7", &"#".parse().unwrap());

        assert!(!trie.is_empty());

        assert!(!trie.remove(&"sub_1", &"#".parse().unwrap()));

        assert!(trie.remove(&"sub_1", &"home/kitchen/temperature".parse().unwrap()));
        assert!(trie.remove(&"sub_2", &"home/kitchen/temperature".parse().unwrap()));
        assert!(trie.remove(&"sub_4", &"home/kitchen/#".parse().unwrap()));
        assert!(trie.remove(&"sub_5", &"home/kitchen/+".parse().unwrap()));
        assert!(trie.remove(&"sub_3", &"home/kitchen/humidity".parse().unwrap()));
        assert!(trie.remove(&"sub_7", &"#".parse().unwrap()));
        assert!(trie.remove(&"sub_6", &"home/kitchen/+".parse().unwrap()));

        assert!(trie.is_empty());

        assert!(!trie.remove(&"sub_6", &"home/kitchen/+".parse().unwrap()));
    }

    #[test]
    fn test_round_trip_restores_structure() {
        let mut trie = FilterTrie::new();
        trie.insert("base", &"a/b".parse().unwrap());

        let before = trie.node_count();

        trie.insert("extra", &"a/b/c/#".parse().unwrap());
        assert!(trie.remove(&"extra", &"a/b/c/#".parse().unwrap()));

        assert_eq!(trie.node_count(), before);
        assert_subscribers_str(&trie, "a/b", &["base"]);
    }

    fn assert_subscribers_str(trie: &FilterTrie<&str>, topic: &str, subscribers: &[&str]) {
        let mut expected = subscribers.to_vec();
        expected.sort_unstable();

        let mut actual = trie.matches(&topic.parse().unwrap());
        actual.sort_unstable();

        assert_eq!(expected, actual, "topic: {}", topic);
    }
}
