//! Test doubles for the driver boundary and serde failure paths.
//!
//! [`ScriptedDriver`] stands in for the opaque topology driver: it records
//! everything injected into it (in order) and serves back whatever output
//! records a test has staged per physical topic. [`FailingSerializer`]
//! exercises the producer's serialization-error path.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;

use crate::driver::TopologyDriver;
use crate::error::{Result, TransportError};
use crate::record::{InputRecord, OutputRecord};
use crate::serdes::Serializer;

/// In-memory scripted driver
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    injected: Mutex<Vec<InputRecord>>,
    outputs: Mutex<BTreeMap<String, VecDeque<OutputRecord>>>,
    inject_failure: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an output record for the poller to read
    pub fn stage_output(&self, record: OutputRecord) {
        self.outputs
            .lock()
            .entry(record.topic.clone())
            .or_default()
            .push_back(record);
    }

    /// Everything injected so far, in injection order
    pub fn injected(&self) -> Vec<InputRecord> {
        self.injected.lock().clone()
    }

    /// Make every subsequent injection fail with the given message
    pub fn fail_injections_with(&self, message: impl Into<String>) {
        *self.inject_failure.lock() = Some(message.into());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl TopologyDriver for ScriptedDriver {
    fn inject(&self, record: &InputRecord) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::driver("driver is closed"));
        }
        if let Some(message) = self.inject_failure.lock().clone() {
            return Err(TransportError::injection(message));
        }
        self.injected.lock().push(record.clone());
        Ok(())
    }

    fn read_next(&self, topic: &str) -> Option<OutputRecord> {
        self.outputs.lock().get_mut(topic).and_then(VecDeque::pop_front)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Serializer that always fails with a fixed message
#[derive(Debug, Clone)]
pub struct FailingSerializer {
    message: String,
}

impl FailingSerializer {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Serializer for FailingSerializer {
    fn serialize(&self, _topic: &str, _datum: &Value) -> Result<Bytes> {
        Err(TransportError::serialization(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::record::to_input_record;
    use crate::topic::{TopicRegistry, TopicSpec};
    use serde_json::json;

    fn record() -> InputRecord {
        let topics = TopicRegistry::new().with_topic("t", TopicSpec::new("t-v1", 1));
        to_input_record(&topics, &Message::new("t"), None, None).unwrap()
    }

    #[test]
    fn test_inject_records_in_order() {
        let driver = ScriptedDriver::new();
        driver.inject(&record()).unwrap();
        driver.inject(&record()).unwrap();
        assert_eq!(driver.injected().len(), 2);
    }

    #[test]
    fn test_staged_outputs_drain_fifo() {
        let driver = ScriptedDriver::new();
        driver.stage_output(OutputRecord::new("t-v1", None, Some(Bytes::from_static(b"1"))));
        driver.stage_output(OutputRecord::new("t-v1", None, Some(Bytes::from_static(b"2"))));

        assert_eq!(
            driver.read_next("t-v1").unwrap().value,
            Some(Bytes::from_static(b"1"))
        );
        assert_eq!(
            driver.read_next("t-v1").unwrap().value,
            Some(Bytes::from_static(b"2"))
        );
        assert!(driver.read_next("t-v1").is_none());
        assert!(driver.read_next("other").is_none());
    }

    #[test]
    fn test_injection_failure_mode() {
        let driver = ScriptedDriver::new();
        driver.fail_injections_with("no thanks");
        let err = driver.inject(&record()).unwrap_err();
        assert!(matches!(err, TransportError::Injection(m) if m == "no thanks"));
    }

    #[test]
    fn test_closed_driver_rejects_injection() {
        let driver = ScriptedDriver::new();
        driver.close().unwrap();
        assert!(driver.is_closed());
        assert!(matches!(
            driver.inject(&record()).unwrap_err(),
            TransportError::Driver(_)
        ));
    }

    #[test]
    fn test_failing_serializer() {
        let serializer = FailingSerializer::new("nope");
        let err = serializer.serialize("t", &json!("v")).unwrap_err();
        assert!(matches!(err, TransportError::Serialization(m) if m == "nope"));
    }
}
