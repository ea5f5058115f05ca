//! Mock producer: serializing submission path, drain loop, and ack delivery.
//!
//! `send` runs the encode pipeline at the submission boundary and enqueues
//! the result onto the inbound stream; with the default capacity of 1 a
//! submission suspends until the drain loop has taken the prior item. The
//! drain loop processes strictly one item at a time, so injection order
//! always equals submission order and no ack is pending while a later item
//! is being drained.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::message::{AckError, AckReceiver, AckSender, Message, RecordMetadata};
use crate::pipeline;
use crate::record::InputRecord;
use crate::serdes::SerdeRegistry;
use crate::topic::TopicRegistry;
use crate::transport::TransportConfig;

/// Callback that forwards an encoded record into the driver
///
/// Built by the transport factory; expected to log failures with full trace
/// before returning them, since a returned error is fatal to the drain task.
pub(crate) type InjectFn = Arc<dyn Fn(&InputRecord) -> Result<()> + Send + Sync>;

/// One queued submission
enum DrainItem {
    /// Fully encoded record ready for injection
    Record {
        record: InputRecord,
        ack: AckSender,
    },
    /// Submission whose payload failed to serialize; acked as an error
    Rejected { reason: String, ack: AckSender },
}

/// Producer-side counters (atomic)
#[derive(Debug, Default)]
struct ProducerStats {
    submitted: AtomicU64,
    injected: AtomicU64,
    rejected: AtomicU64,
}

/// Snapshot of producer statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerStatsSnapshot {
    /// Messages accepted onto the inbound stream
    pub submitted: u64,
    /// Records successfully injected into the driver
    pub injected: u64,
    /// Submissions acked with a serialization error
    pub rejected: u64,
}

/// Mock producer handle
pub struct MockProducer {
    items: Option<mpsc::Sender<DrainItem>>,
    topics: Arc<TopicRegistry>,
    serdes: Arc<SerdeRegistry>,
    stats: Arc<ProducerStats>,
    task: JoinHandle<Result<()>>,
}

impl MockProducer {
    /// Construct the producer and spawn its drain loop
    pub(crate) fn start(
        topics: Arc<TopicRegistry>,
        serdes: Arc<SerdeRegistry>,
        inject: InjectFn,
        config: &TransportConfig,
    ) -> Self {
        let (items_tx, items_rx) = mpsc::channel(config.channel_capacity.max(1));
        let stats = Arc::new(ProducerStats::default());
        let task = tokio::spawn(drain_loop(items_rx, inject, stats.clone()));

        Self {
            items: Some(items_tx),
            topics,
            serdes,
            stats,
            task,
        }
    }

    /// Submit one message
    ///
    /// Serializes the payloads immediately. A serialization failure is not an
    /// error here: the message is enqueued with an error marker and its ack
    /// resolves to `serialization-error`. An unknown logical topic fails the
    /// call itself. Suspends while the inbound stream is at capacity.
    ///
    /// Returns the receiver for the message's single-resolution ack.
    pub async fn send(&self, message: Message) -> Result<AckReceiver> {
        let items = self
            .items
            .as_ref()
            .ok_or_else(|| TransportError::stream_closed("producer inbound stream is closed"))?;

        let (ack_tx, ack_rx) = oneshot::channel();
        let item = match pipeline::encode(&self.topics, &self.serdes, &message) {
            Ok(record) => DrainItem::Record {
                record,
                ack: ack_tx,
            },
            Err(TransportError::Serialization(reason)) => {
                warn!(topic = %message.topic, error = %reason, "payload serialization failed, acking as error");
                DrainItem::Rejected {
                    reason,
                    ack: ack_tx,
                }
            }
            Err(e) => return Err(e),
        };

        items
            .send(item)
            .await
            .map_err(|_| TransportError::stream_closed("producer drain loop has terminated"))?;
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(ack_rx)
    }

    /// Close the inbound stream
    ///
    /// Already-queued submissions still drain and resolve their acks; the
    /// drain loop terminates once the queue is empty.
    pub fn close(&mut self) {
        if self.items.take().is_some() {
            debug!("producer inbound stream closed");
        }
    }

    /// Snapshot of the producer's counters
    pub fn stats(&self) -> ProducerStatsSnapshot {
        ProducerStatsSnapshot {
            submitted: self.stats.submitted.load(Ordering::Relaxed),
            injected: self.stats.injected.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
        }
    }

    /// Close the inbound stream and await the drain loop
    ///
    /// Surfaces an injection failure that killed the drain task.
    pub async fn join(self) -> Result<()> {
        let Self { items, task, .. } = self;
        drop(items);
        task.await?
    }
}

/// Drain one item at a time until the inbound stream closes
async fn drain_loop(
    mut items: mpsc::Receiver<DrainItem>,
    inject: InjectFn,
    stats: Arc<ProducerStats>,
) -> Result<()> {
    while let Some(item) = items.recv().await {
        match item {
            DrainItem::Rejected { reason, ack } => {
                stats.rejected.fetch_add(1, Ordering::Relaxed);
                let _ = ack.send(Err(AckError::SerializationError { message: reason }));
            }
            DrainItem::Record { record, ack } => {
                // Fatal on failure: the pending ack drops with the task and
                // the error surfaces to whoever awaits the completion handle
                inject(&record)?;
                stats.injected.fetch_add(1, Ordering::Relaxed);
                let _ = ack.send(Ok(RecordMetadata {
                    topic: record.topic,
                    partition: record.partition,
                    offset: record.offset,
                }));
            }
        }
    }
    debug!("drain loop finished: inbound stream closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::TopologyDriver;
    use crate::message::{UNASSIGNED_OFFSET, UNASSIGNED_PARTITION};
    use crate::serdes::{SerdePair, TopicSerde};
    use crate::testing::{FailingSerializer, ScriptedDriver};
    use crate::topic::{TopicRegistry, TopicSpec};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn fixtures() -> (Arc<ScriptedDriver>, Arc<TopicRegistry>, Arc<SerdeRegistry>) {
        let topics = TopicRegistry::new().with_topic("t", TopicSpec::new("t-in", 1));
        let serdes = SerdeRegistry::json_for(&topics);
        (
            Arc::new(ScriptedDriver::new()),
            Arc::new(topics),
            Arc::new(serdes),
        )
    }

    fn inject_into(driver: &Arc<ScriptedDriver>) -> InjectFn {
        let driver = driver.clone();
        Arc::new(move |record: &InputRecord| driver.inject(record))
    }

    fn producer(
        driver: &Arc<ScriptedDriver>,
        topics: Arc<TopicRegistry>,
        serdes: Arc<SerdeRegistry>,
    ) -> MockProducer {
        MockProducer::start(topics, serdes, inject_into(driver), &TransportConfig::default())
    }

    #[tokio::test]
    async fn test_send_resolves_success_ack() {
        let (driver, topics, serdes) = fixtures();
        let producer = producer(&driver, topics, serdes);

        let ack = producer
            .send(Message::new("t").with_value(json!("v1")))
            .await
            .unwrap();
        let metadata = ack.await.unwrap().unwrap();
        assert_eq!(metadata.topic, "t-in");
        assert_eq!(metadata.partition, UNASSIGNED_PARTITION);
        assert_eq!(metadata.offset, UNASSIGNED_OFFSET);

        producer.join().await.unwrap();
        assert_eq!(driver.injected().len(), 1);
    }

    #[tokio::test]
    async fn test_serialization_failure_acks_error_and_loop_continues() {
        let (driver, topics, serdes) = fixtures();
        let serdes = Arc::new(
            SerdeRegistry::json_for(&topics).with_topic_serde(
                "t",
                TopicSerde {
                    key: SerdePair::json(),
                    value: SerdePair::new(
                        Arc::new(FailingSerializer::new("boom")),
                        SerdePair::json().deserializer,
                    ),
                },
            ),
        );
        let producer = producer(&driver, topics, serdes);

        let ack = producer
            .send(Message::new("t").with_value(json!("v")))
            .await
            .unwrap();
        let err = ack.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            AckError::SerializationError { ref message } if message.contains("boom")
        ));

        // A message without a value never touches the failing serde
        let ack = producer.send(Message::new("t")).await.unwrap();
        assert!(ack.await.unwrap().is_ok());

        let stats = producer.stats();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.injected, 1);

        producer.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_topic_fails_the_send_call() {
        let (driver, topics, serdes) = fixtures();
        let producer = producer(&driver, topics, serdes);

        let err = producer.send(Message::new("missing")).await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownTopic(_)));
        assert_eq!(producer.stats().submitted, 0);

        producer.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_injection_order_equals_submission_order() {
        let (driver, topics, serdes) = fixtures();
        let producer = producer(&driver, topics, serdes);

        let mut acks = Vec::new();
        for i in 0..10 {
            let ack = producer
                .send(Message::new("t").with_key(json!(i)))
                .await
                .unwrap();
            acks.push(ack);
        }
        for ack in acks {
            ack.await.unwrap().unwrap();
        }

        let keys: Vec<String> = driver
            .injected()
            .iter()
            .map(|r| String::from_utf8(r.key.clone().unwrap().to_vec()).unwrap())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(keys, expected);

        producer.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_rejects_new_sends_but_drains_queued() {
        let (driver, topics, serdes) = fixtures();
        let mut producer = producer(&driver, topics, serdes);

        let ack = producer.send(Message::new("t")).await.unwrap();
        producer.close();

        let err = producer.send(Message::new("t")).await.unwrap_err();
        assert!(matches!(err, TransportError::StreamClosed(_)));

        // The queued submission still resolves
        timeout(Duration::from_secs(1), ack)
            .await
            .expect("ack should resolve")
            .unwrap()
            .unwrap();

        producer.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_injection_failure_is_fatal_and_surfaces_on_join() {
        let (driver, topics, serdes) = fixtures();
        driver.fail_injections_with("driver rejected record");
        let producer = producer(&driver, topics, serdes);

        let ack = producer.send(Message::new("t")).await.unwrap();
        // The pending ack drops unresolved with the drain task
        assert!(ack.await.is_err());

        let err = producer.join().await.unwrap_err();
        assert!(matches!(err, TransportError::Injection(_)));
    }
}
