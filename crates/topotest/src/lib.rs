//! Deterministic mock transport for exercising streaming topologies.
//!
//! `topotest` simulates a message-queue producer and consumer on top of an
//! in-process topology test driver, so event-streaming logic can be driven
//! deterministically without a live broker. The transport bridges the
//! driver's pull-based synchronous record API onto push-based asynchronous
//! streams, handles serialization at the boundary, delivers one ack per
//! submitted message, and shuts down cooperatively without leaking tasks.
//!
//! ```text
//!  test code ──send()──▶ producer: encode ─▶ drain loop ──inject──▶ ┌────────┐
//!       ▲                                        │                  │ driver │
//!       └────────────── ack (oneshot) ◀──────────┘                  └────┬───┘
//!                                                                       │ read_next
//!  test code ◀──recv()── consumer stream ◀── decode ◀── poll loop ◀─────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use topotest::{Message, Transport, TransportConfig, TopicRegistry, TopicSpec};
//!
//! let topics = TopicRegistry::new().with_topic("orders", TopicSpec::new("orders-v1", 1));
//! let transport = Transport::start(driver, topics, TransportConfig::default()).await?;
//!
//! let ack = transport.producer.send(Message::new("orders").with_value("hello")).await?;
//! let metadata = ack.await??;
//!
//! while let Some(event) = transport.consumer.recv().await {
//!     // assert on delivered messages
//! }
//!
//! transport.shutdown().await?;
//! ```

pub mod consumer;
pub mod driver;
pub mod error;
pub mod message;
mod pipeline;
mod poller;
pub mod producer;
pub mod record;
pub mod serdes;
pub mod testing;
pub mod topic;
pub mod transport;

pub use consumer::{ConsumerState, ConsumerStatsSnapshot, MockConsumer, PollEvent};
pub use driver::{SharedDriver, TopologyDriver};
pub use error::{Result, TransportError};
pub use message::{
    AckError, AckReceiver, AckResult, Message, RecordMetadata, UNASSIGNED_OFFSET,
    UNASSIGNED_PARTITION,
};
pub use producer::{MockProducer, ProducerStatsSnapshot};
pub use record::{to_input_record, InputRecord, OutputRecord};
pub use serdes::{Deserializer, JsonSerde, SerdePair, SerdeRegistry, Serializer, TopicSerde};
pub use topic::{TopicRegistry, TopicSpec};
pub use transport::{
    Transport, TransportConfig, TransportConfigBuilder, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_POLL_INTERVAL,
};
