//! Records crossing the driver boundary and the adapter conversions.
//!
//! Input records flow application → driver, output records flow driver →
//! application. The conversions here are pure: payload serde happens in the
//! pipeline layer, not in the adapter.

use bytes::Bytes;

use crate::error::Result;
use crate::message::{now_ms, Message, UNASSIGNED_OFFSET, UNASSIGNED_PARTITION};
use crate::topic::TopicRegistry;

/// A record handed to the driver for injection
///
/// Built once per submitted message and never mutated afterwards. Partition
/// and offset carry the unassigned sentinels: the mock transport does no
/// partitioning and the driver commits no offsets back into the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    /// Physical topic name on the driver
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Creation time of the submitted message, in milliseconds
    pub timestamp_ms: i64,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    /// Serialized key length in bytes, 0 when absent
    pub key_size: usize,
    /// Serialized value length in bytes, 0 when absent
    pub value_size: usize,
}

/// A record read back from the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    /// Physical topic name on the driver
    pub topic: String,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub partition: i32,
}

impl OutputRecord {
    /// Create an output record with no partition assignment
    pub fn new(topic: impl Into<String>, key: Option<Bytes>, value: Option<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            key,
            value,
            partition: UNASSIGNED_PARTITION,
        }
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }
}

/// Build an [`InputRecord`] from a submitted message and its serialized
/// payloads
///
/// Resolves the physical topic name from the message's logical alias
/// (failing with `UnknownTopic` if absent), computes payload sizes, and
/// stamps the unassigned partition/offset sentinels. The timestamp is taken
/// from the message; a message without one is stamped at conversion time.
pub fn to_input_record(
    topics: &TopicRegistry,
    message: &Message,
    key: Option<Bytes>,
    value: Option<Bytes>,
) -> Result<InputRecord> {
    let spec = topics.physical(&message.topic)?;
    Ok(InputRecord {
        topic: spec.name.clone(),
        partition: UNASSIGNED_PARTITION,
        offset: UNASSIGNED_OFFSET,
        timestamp_ms: message.timestamp_ms.unwrap_or_else(now_ms),
        key_size: key.as_ref().map(Bytes::len).unwrap_or(0),
        value_size: value.as_ref().map(Bytes::len).unwrap_or(0),
        key,
        value,
    })
}

/// Intermediate envelope lifted from an output record, before deserialization
/// and logical-topic rewrite
#[derive(Debug, Clone)]
pub(crate) struct RawMessage {
    pub topic: String,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub partition: i32,
}

/// Lift topic/key/value/partition out of an output record, defaulting the
/// partition to [`UNASSIGNED_PARTITION`] when the driver withheld it
pub(crate) fn from_output_record(record: OutputRecord) -> RawMessage {
    RawMessage {
        topic: record.topic,
        key: record.key,
        value: record.value,
        partition: if record.partition < 0 {
            UNASSIGNED_PARTITION
        } else {
            record.partition
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::topic::TopicSpec;

    fn topics() -> TopicRegistry {
        TopicRegistry::new().with_topic("orders", TopicSpec::new("orders-v1", 1))
    }

    #[test]
    fn test_to_input_record() {
        let msg = Message::new("orders").with_timestamp_ms(1234);
        let record = to_input_record(
            &topics(),
            &msg,
            Some(Bytes::from_static(b"k1")),
            Some(Bytes::from_static(b"v-longer")),
        )
        .unwrap();

        assert_eq!(record.topic, "orders-v1");
        assert_eq!(record.partition, UNASSIGNED_PARTITION);
        assert_eq!(record.offset, UNASSIGNED_OFFSET);
        assert_eq!(record.timestamp_ms, 1234);
        assert_eq!(record.key_size, 2);
        assert_eq!(record.value_size, 8);
    }

    #[test]
    fn test_to_input_record_absent_payloads() {
        let msg = Message::new("orders");
        let record = to_input_record(&topics(), &msg, None, None).unwrap();
        assert_eq!(record.key_size, 0);
        assert_eq!(record.value_size, 0);
        assert!(record.key.is_none());
        assert!(record.value.is_none());
    }

    #[test]
    fn test_to_input_record_unknown_topic() {
        let msg = Message::new("missing");
        let err = to_input_record(&topics(), &msg, None, None).unwrap_err();
        assert!(matches!(err, TransportError::UnknownTopic(_)));
    }

    #[test]
    fn test_from_output_record_defaults_partition() {
        let raw = from_output_record(OutputRecord::new("orders-v1", None, None));
        assert_eq!(raw.partition, UNASSIGNED_PARTITION);

        let raw = from_output_record(
            OutputRecord::new("orders-v1", None, None).with_partition(2),
        );
        assert_eq!(raw.partition, 2);

        // Driver-reported negative partitions normalize to the sentinel
        let raw = from_output_record(
            OutputRecord::new("orders-v1", None, None).with_partition(-7),
        );
        assert_eq!(raw.partition, UNASSIGNED_PARTITION);
    }
}
