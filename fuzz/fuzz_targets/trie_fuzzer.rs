#![no_main]
use libfuzzer_sys::fuzz_target;
use topic_index::{FilterTrie, TopicFilter};

// Insert a subscription per parseable input line, then remove them all
// and check the tree drains completely.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let filters: Vec<TopicFilter> = s.lines().filter_map(|line| line.parse().ok()).collect();

        let mut trie = FilterTrie::new();

        for (id, filter) in filters.iter().enumerate() {
            trie.insert(id, filter);
        }

        for (id, filter) in filters.iter().enumerate() {
            assert!(trie.remove(&id, filter));
        }

        assert!(trie.is_empty());
    }
});
