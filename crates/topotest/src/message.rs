//! Message envelope and acknowledgement types.
//!
//! A [`Message`] is the generic envelope used on both sides of the transport:
//! test code submits one to the producer, and the consumer stream delivers
//! one per record the topology emitted. Acks are delivered over a
//! `tokio::sync::oneshot` channel, so a second resolution is unrepresentable.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

/// Partition sentinel for records that have not been assigned one
pub const UNASSIGNED_PARTITION: i32 = -1;
/// Offset sentinel for records that have not been committed
pub const UNASSIGNED_OFFSET: i64 = -1;

/// Generic message envelope
///
/// `topic` is always the logical alias, never the physical driver name.
/// Delivered messages carry the partition the driver reported (or
/// [`UNASSIGNED_PARTITION`] when it withheld one) and no timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub key: Option<Value>,
    pub value: Option<Value>,
    pub partition: i32,
    /// Creation time in milliseconds; set on submission, absent on delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

impl Message {
    /// Create a message for submission, stamped with the current time
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            value: None,
            partition: UNASSIGNED_PARTITION,
            timestamp_ms: Some(now_ms()),
        }
    }

    pub fn with_key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Override the creation timestamp
    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// Wall clock in milliseconds since the Unix epoch
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Metadata returned on a successful ack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Physical topic name the record was injected under
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Error result of an ack
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AckError {
    /// The submitted payload could not be serialized
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Resolution of one submitted message
pub type AckResult = std::result::Result<RecordMetadata, AckError>;

/// Receiving half of an ack, returned by the producer on submission
pub type AckReceiver = oneshot::Receiver<AckResult>;

/// Sending half of an ack, resolved exactly once by the drain loop
pub(crate) type AckSender = oneshot::Sender<AckResult>;
