//! Topic registry: logical aliases mapped to physical driver topics.
//!
//! Test code addresses topics by a logical alias; the driver only knows the
//! physical topic names of the topology under test. The registry owns the
//! mapping in both directions and is immutable for the transport's lifetime.
//! Iteration is sorted by alias so that a poll cycle drains topics in a
//! stable order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};

/// Physical shape of one registered topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    /// Physical topic name on the driver
    pub name: String,
    /// Partition count of the topic
    pub partitions: u32,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>, partitions: u32) -> Self {
        Self {
            name: name.into(),
            partitions,
        }
    }
}

/// Immutable logical-alias → [`TopicSpec`] mapping
#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    topics: BTreeMap<String, TopicSpec>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic under a logical alias (builder style)
    pub fn with_topic(mut self, alias: impl Into<String>, spec: TopicSpec) -> Self {
        self.topics.insert(alias.into(), spec);
        self
    }

    /// Resolve a logical alias to its physical spec
    pub fn physical(&self, alias: &str) -> Result<&TopicSpec> {
        self.topics
            .get(alias)
            .ok_or_else(|| TransportError::UnknownTopic(alias.to_string()))
    }

    /// Reverse lookup: physical topic name back to its logical alias
    pub fn logical(&self, physical_name: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|(_, spec)| spec.name == physical_name)
            .map(|(alias, _)| alias.as_str())
    }

    /// Iterate registered topics in stable (sorted-by-alias) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicSpec)> {
        self.topics.iter().map(|(alias, spec)| (alias.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
