//! Pluggable per-topic serializers and deserializers.
//!
//! Every registered topic carries a serde pair for its key and one for its
//! value. The transport factory fills the registry with JSON serdes for each
//! topic; tests override individual topics when they need a different (or
//! failing) codec.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Result, TransportError};
use crate::topic::TopicRegistry;

/// Turn a payload into bytes for the driver
pub trait Serializer: Send + Sync {
    /// Serialize one datum; `topic` is the physical topic name
    fn serialize(&self, topic: &str, datum: &Value) -> Result<Bytes>;
}

/// Turn driver bytes back into a payload
pub trait Deserializer: Send + Sync {
    /// Deserialize one payload; `topic` is the physical topic name
    fn deserialize(&self, topic: &str, payload: &[u8]) -> Result<Value>;
}

/// Serializer/deserializer pair for one field (key or value)
#[derive(Clone)]
pub struct SerdePair {
    pub serializer: Arc<dyn Serializer>,
    pub deserializer: Arc<dyn Deserializer>,
}

impl SerdePair {
    pub fn new(serializer: Arc<dyn Serializer>, deserializer: Arc<dyn Deserializer>) -> Self {
        Self {
            serializer,
            deserializer,
        }
    }

    /// JSON pair backed by [`JsonSerde`]
    pub fn json() -> Self {
        let serde = Arc::new(JsonSerde);
        Self::new(serde.clone(), serde)
    }
}

/// Key and value serdes for one topic
#[derive(Clone)]
pub struct TopicSerde {
    pub key: SerdePair,
    pub value: SerdePair,
}

impl std::fmt::Debug for TopicSerde {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicSerde").finish_non_exhaustive()
    }
}

impl TopicSerde {
    /// JSON serdes for both key and value
    pub fn json() -> Self {
        Self {
            key: SerdePair::json(),
            value: SerdePair::json(),
        }
    }
}

/// Per-topic serde registry, keyed by logical alias
#[derive(Clone, Default)]
pub struct SerdeRegistry {
    map: HashMap<String, TopicSerde>,
}

impl SerdeRegistry {
    /// Build a registry with JSON serdes for every registered topic
    pub fn json_for(topics: &TopicRegistry) -> Self {
        let map = topics
            .iter()
            .map(|(alias, _)| (alias.to_string(), TopicSerde::json()))
            .collect();
        Self { map }
    }

    /// Override the serdes of one topic (builder style)
    pub fn with_topic_serde(mut self, alias: impl Into<String>, serde: TopicSerde) -> Self {
        self.map.insert(alias.into(), serde);
        self
    }

    /// Look up the serdes of a topic by logical alias
    pub fn get(&self, alias: &str) -> Result<&TopicSerde> {
        self.map
            .get(alias)
            .ok_or_else(|| TransportError::UnknownTopic(alias.to_string()))
    }
}

/// JSON serde backed by `serde_json`, the default for every topic
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerde;

impl Serializer for JsonSerde {
    fn serialize(&self, _topic: &str, datum: &Value) -> Result<Bytes> {
        serde_json::to_vec(datum)
            .map(Bytes::from)
            .map_err(|e| TransportError::serialization(e.to_string()))
    }
}

impl Deserializer for JsonSerde {
    fn deserialize(&self, _topic: &str, payload: &[u8]) -> Result<Value> {
        serde_json::from_slice(payload)
            .map_err(|e| TransportError::deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::TopicSpec;
    use serde_json::json;

    #[test]
    fn test_json_serde_round_trip() {
        let serde = JsonSerde;
        let datum = json!({"id": 7, "tags": ["a", "b"]});
        let bytes = serde.serialize("t", &datum).unwrap();
        let back = serde.deserialize("t", &bytes).unwrap();
        assert_eq!(back, datum);
    }

    #[test]
    fn test_json_deserialize_error() {
        let serde = JsonSerde;
        let err = serde.deserialize("t", b"not json").unwrap_err();
        assert!(err.is_serde());
    }

    #[test]
    fn test_registry_covers_all_topics() {
        let topics = TopicRegistry::new()
            .with_topic("a", TopicSpec::new("a-v1", 1))
            .with_topic("b", TopicSpec::new("b-v1", 1));
        let serdes = SerdeRegistry::json_for(&topics);
        assert!(serdes.get("a").is_ok());
        assert!(serdes.get("b").is_ok());
        assert!(matches!(
            serdes.get("c").unwrap_err(),
            TransportError::UnknownTopic(_)
        ));
    }
}
