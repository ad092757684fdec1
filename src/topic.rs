use crate::{
    MAX_TOPIC_LEN_BYTES, MULTI_LEVEL_WILDCARD, MULTI_LEVEL_WILDCARD_STR, SINGLE_LEVEL_WILDCARD,
    SINGLE_LEVEL_WILDCARD_STR, TOPIC_SEPARATOR,
};
use std::{fmt, str::FromStr};

/// A filter subscribers register to indicate which topics they want
/// to receive messages from. Can contain wildcards.
#[derive(Debug, PartialEq)]
pub enum TopicFilter {
    Concrete { filter: String },
    Wildcard { filter: String },
}

/// A topic name publishers use when sending messages.
/// Cannot contain wildcards.
#[derive(Debug, PartialEq)]
pub struct Topic {
    topic_name: String,
}

#[derive(Debug, PartialEq)]
pub enum TopicParseError {
    EmptyTopic,
    TopicTooLong,
    MultilevelWildcardNotAtEnd,
    InvalidWildcardLevel,
    WildcardOrNullInTopic,
}

impl fmt::Display for TopicParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicParseError::EmptyTopic => write!(f, "topics and filters cannot be empty"),
            TopicParseError::TopicTooLong => {
                write!(f, "topics and filters cannot exceed {} bytes", MAX_TOPIC_LEN_BYTES)
            },
            TopicParseError::MultilevelWildcardNotAtEnd => {
                write!(f, "a multi-level wildcard must be the last level of a filter")
            },
            TopicParseError::InvalidWildcardLevel => {
                write!(f, "wildcards must occupy an entire filter level")
            },
            TopicParseError::WildcardOrNullInTopic => {
                write!(f, "topic names cannot contain wildcards or null characters")
            },
        }
    }
}

impl std::error::Error for TopicParseError {}

/// One `/`-separated segment of a filter or topic. Empty segments are
/// valid levels, so `a//b` has three levels and `/` has two.
#[derive(Debug, PartialEq)]
pub enum TopicLevel<'a> {
    Concrete(&'a str),
    SingleLevelWildcard,
    MultiLevelWildcard,
}

/// If Ok, returns whether the filter contains wildcards.
fn process_filter(filter: &str) -> Result<bool, TopicParseError> {
    let mut contains_wildcards = false;
    for level in filter.split(TOPIC_SEPARATOR) {
        let level_contains_wildcard =
            level.contains(|x: char| x == SINGLE_LEVEL_WILDCARD || x == MULTI_LEVEL_WILDCARD);
        if level_contains_wildcard {
            // Any wildcards on a particular level must be specified on their own
            if level.len() > 1 {
                return Err(TopicParseError::InvalidWildcardLevel);
            }

            contains_wildcards = true;
        }
    }

    Ok(contains_wildcards)
}

impl FromStr for TopicFilter {
    type Err = TopicParseError;

    fn from_str(filter: &str) -> Result<Self, Self::Err> {
        // Filters and topics cannot be empty
        if filter.is_empty() {
            return Err(TopicParseError::EmptyTopic);
        }

        if filter.contains('\0') {
            return Err(TopicParseError::WildcardOrNullInTopic);
        }

        if filter.len() > MAX_TOPIC_LEN_BYTES {
            return Err(TopicParseError::TopicTooLong);
        }

        // Multi-level wildcards can only be at the end of the filter
        if let Some(pos) = filter.rfind(MULTI_LEVEL_WILDCARD) {
            if pos != filter.len() - 1 {
                return Err(TopicParseError::MultilevelWildcardNotAtEnd);
            }
        }

        let topic_filter = if process_filter(filter)? {
            TopicFilter::Wildcard { filter: filter.to_string() }
        } else {
            TopicFilter::Concrete { filter: filter.to_string() }
        };

        Ok(topic_filter)
    }
}

impl FromStr for Topic {
    type Err = TopicParseError;

    fn from_str(topic: &str) -> Result<Self, Self::Err> {
        // Topics cannot be empty
        if topic.is_empty() {
            return Err(TopicParseError::EmptyTopic);
        }

        if topic.len() > MAX_TOPIC_LEN_BYTES {
            return Err(TopicParseError::TopicTooLong);
        }

        // Topics cannot contain wildcards or null characters
        if topic.contains(|x: char| {
            x == SINGLE_LEVEL_WILDCARD || x == MULTI_LEVEL_WILDCARD || x == '\0'
        }) {
            return Err(TopicParseError::WildcardOrNullInTopic);
        }

        Ok(Topic { topic_name: topic.to_string() })
    }
}

pub struct TopicLevels<'a> {
    levels_iter: std::str::Split<'a, char>,
}

impl<'a> TopicFilter {
    fn filter(&'a self) -> &'a str {
        match self {
            TopicFilter::Concrete { filter } => filter,
            TopicFilter::Wildcard { filter } => filter,
        }
    }

    pub fn levels(&'a self) -> TopicLevels<'a> {
        TopicLevels { levels_iter: self.filter().split(TOPIC_SEPARATOR) }
    }
}

impl<'a> Topic {
    pub fn levels(&'a self) -> TopicLevels<'a> {
        TopicLevels { levels_iter: self.topic_name.split(TOPIC_SEPARATOR) }
    }
}

impl<'a> Iterator for TopicLevels<'a> {
    type Item = TopicLevel<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.levels_iter.next() {
            Some(MULTI_LEVEL_WILDCARD_STR) => Some(TopicLevel::MultiLevelWildcard),
            Some(SINGLE_LEVEL_WILDCARD_STR) => Some(TopicLevel::SingleLevelWildcard),
            Some(level) => Some(TopicLevel::Concrete(level)),
            None => None,
        }
    }
}
