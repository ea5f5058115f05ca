//! Transport factory: wiring, configuration, and two-phase shutdown.
//!
//! `Transport::start` wires a driver, a topic registry, and a serde registry
//! into a consumer and a producer. The producer is only constructed once the
//! consumer's poll loop has reported in, so nothing can be injected before
//! the read side is live. Shutdown is strictly two-phase: signal everything
//! first, then await both background tasks, so the transport never outlives
//! its asynchronous work.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::consumer::MockConsumer;
use crate::driver::{SharedDriver, TopologyDriver};
use crate::error::Result;
use crate::producer::{InjectFn, MockProducer};
use crate::record::InputRecord;
use crate::serdes::SerdeRegistry;
use crate::topic::TopicRegistry;

/// Default interval between poll cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Default capacity of the producer and consumer streams
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Transport tuning knobs
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Interval between consumer poll cycles
    pub poll_interval: Duration,
    /// Capacity of the inbound and outbound streams; 1 gives per-message
    /// backpressure on both sides
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl TransportConfig {
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`]
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the interval between poll cycles
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the stream capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    pub fn build(self) -> TransportConfig {
        self.config
    }
}

/// A running mock transport
pub struct Transport {
    pub consumer: MockConsumer,
    pub producer: MockProducer,
    pub topics: Arc<TopicRegistry>,
    pub serdes: Arc<SerdeRegistry>,
    driver: SharedDriver,
}

impl Transport {
    /// Start a transport with JSON serdes for every registered topic
    pub async fn start(
        driver: SharedDriver,
        topics: TopicRegistry,
        config: TransportConfig,
    ) -> Result<Self> {
        let serdes = Arc::new(SerdeRegistry::json_for(&topics));
        Self::start_with_serdes(driver, topics, serdes, config).await
    }

    /// Start a transport with an explicit serde registry
    pub async fn start_with_serdes(
        driver: SharedDriver,
        topics: TopicRegistry,
        serdes: Arc<SerdeRegistry>,
        config: TransportConfig,
    ) -> Result<Self> {
        let topics = Arc::new(topics);

        let mut consumer =
            MockConsumer::start(driver.clone(), topics.clone(), serdes.clone(), &config);
        // The producer must not exist before the read side is live
        consumer.started().await?;

        let inject: InjectFn = {
            let driver = driver.clone();
            Arc::new(move |record: &InputRecord| {
                driver.inject(record).map_err(|e| {
                    error!(
                        topic = %record.topic,
                        timestamp_ms = record.timestamp_ms,
                        error = ?e,
                        "record injection into the topology driver failed"
                    );
                    e
                })
            })
        };
        let producer = MockProducer::start(topics.clone(), serdes.clone(), inject, &config);

        info!(
            topics = topics.len(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "mock transport started"
        );
        Ok(Self {
            consumer,
            producer,
            topics,
            serdes,
            driver,
        })
    }

    /// Shut the transport down
    ///
    /// Phase one signals: close the driver, close the producer's inbound
    /// stream, cancel the consumer. Phase two awaits both background tasks.
    /// A drain-task injection failure takes precedence over a driver close
    /// failure in the returned result; neither is swallowed.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("transport shutting down");

        let driver_result = self.driver.close();
        if let Err(ref e) = driver_result {
            warn!(error = %e, "driver close failed");
        }
        self.producer.close();
        self.consumer.stop();

        let producer_result = self.producer.join().await;
        self.consumer.join().await?;

        producer_result?;
        driver_result
    }
}
