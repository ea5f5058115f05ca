//! Composed codec pipelines, one per direction.
//!
//! Encode (producer side): serialize key/value with the topic's serdes, then
//! adapt to an [`InputRecord`]. Decode (consumer side): lift the output
//! record, deserialize key/value, and rewrite the physical topic name back
//! to its logical alias. Keeping each direction in a single function avoids
//! ambient state between stages.

use crate::error::{Result, TransportError};
use crate::message::Message;
use crate::record::{from_output_record, to_input_record, InputRecord, OutputRecord};
use crate::serdes::SerdeRegistry;
use crate::topic::TopicRegistry;

/// Serialize a submitted message and adapt it to an input record
pub(crate) fn encode(
    topics: &TopicRegistry,
    serdes: &SerdeRegistry,
    message: &Message,
) -> Result<InputRecord> {
    let serde = serdes.get(&message.topic)?;
    let physical = &topics.physical(&message.topic)?.name;

    let key = message
        .key
        .as_ref()
        .map(|k| serde.key.serializer.serialize(physical, k))
        .transpose()?;
    let value = message
        .value
        .as_ref()
        .map(|v| serde.value.serializer.serialize(physical, v))
        .transpose()?;

    to_input_record(topics, message, key, value)
}

/// Adapt a driver output record and deserialize it into a message
///
/// The delivered message carries the logical alias (via reverse lookup) and
/// no timestamp.
pub(crate) fn decode(
    topics: &TopicRegistry,
    serdes: &SerdeRegistry,
    record: OutputRecord,
) -> Result<Message> {
    let raw = from_output_record(record);
    let alias = topics
        .logical(&raw.topic)
        .ok_or_else(|| TransportError::UnknownTopic(raw.topic.clone()))?;
    let serde = serdes.get(alias)?;

    let key = raw
        .key
        .as_ref()
        .map(|k| serde.key.deserializer.deserialize(&raw.topic, k))
        .transpose()?;
    let value = raw
        .value
        .as_ref()
        .map(|v| serde.value.deserializer.deserialize(&raw.topic, v))
        .transpose()?;

    Ok(Message {
        topic: alias.to_string(),
        key,
        value,
        partition: raw.partition,
        timestamp_ms: None,
    })
}
