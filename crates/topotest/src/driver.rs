//! The topology driver boundary.
//!
//! The driver is an external collaborator: an in-process harness that runs a
//! streaming topology against injected records and exposes emitted records
//! for inspection. The transport only needs the three operations below and
//! treats everything else about the driver as opaque.

use std::sync::Arc;

use crate::error::Result;
use crate::record::{InputRecord, OutputRecord};

/// Opaque handle to the topology under test
///
/// The read side is pull-based and synchronous; the transport's consumer
/// bridges it onto an asynchronous stream.
pub trait TopologyDriver: Send + Sync {
    /// Feed one record into the topology. May fail.
    fn inject(&self, record: &InputRecord) -> Result<()>;

    /// Pull the next available output record for a physical topic, or `None`
    /// when the topic currently has nothing to read
    fn read_next(&self, topic: &str) -> Option<OutputRecord>;

    /// Release the driver's resources
    fn close(&self) -> Result<()>;
}

/// Shared driver handle, cloned into the consumer and producer tasks
pub type SharedDriver = Arc<dyn TopologyDriver>;
