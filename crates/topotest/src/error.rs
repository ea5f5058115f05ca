//! Error types for the mock transport.

use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised by the mock transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// No topic is registered under the given logical alias (or physical name)
    #[error("Unknown topic: '{0}' is not registered")]
    UnknownTopic(String),

    /// Payload serialization failed on the producer side
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Payload deserialization failed on the consumer side
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Forwarding a record into the topology driver failed
    #[error("Injection error: {0}")]
    Injection(String),

    /// The driver handle itself failed (e.g. on close)
    #[error("Driver error: {0}")]
    Driver(String),

    /// A channel endpoint was closed while the other side still needed it
    #[error("Stream closed: {0}")]
    StreamClosed(String),

    /// A background task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TransportError {
    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a deserialization error
    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Create an injection error
    pub fn injection(msg: impl Into<String>) -> Self {
        Self::Injection(msg.into())
    }

    /// Create a driver error
    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// Create a stream-closed error
    pub fn stream_closed(msg: impl Into<String>) -> Self {
        Self::StreamClosed(msg.into())
    }

    /// Whether this error came from the payload serde boundary
    pub fn is_serde(&self) -> bool {
        matches!(self, Self::Serialization(_) | Self::Deserialization(_))
    }
}
