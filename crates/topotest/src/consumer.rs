//! Mock consumer: poll loop, lifecycle, and the deserialized output stream.
//!
//! The consumer bridges the driver's pull-based read API onto a push-based
//! stream. Construction spawns the poll loop as an independent task and
//! returns immediately; the loop resolves the started signal on its first
//! iteration, runs one poll cycle per interval, and shuts down cooperatively
//! when its cancellation token fires. Cancellation is observed only at the
//! loop boundary, so stop latency is bounded by roughly one poll interval.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::driver::SharedDriver;
use crate::error::{Result, TransportError};
use crate::message::Message;
use crate::poller::{poll_cycle, PollSummary};
use crate::serdes::SerdeRegistry;
use crate::topic::TopicRegistry;
use crate::transport::TransportConfig;

/// Lifecycle of a consumer instance (linear, no cycles)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Constructed, poll loop not yet scheduled its first iteration
    NotStarted,
    /// Poll loop running
    Polling,
    /// Cancellation observed, output stream closing
    Stopping,
    /// Poll loop terminated
    Stopped,
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::Polling => write!(f, "polling"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Item type of the consumer's output stream
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// One poll cycle's records, concatenated in topic-iteration order
    Batch(Vec<Message>),
    /// A poll-cycle failure downgraded to a stream event
    Error(String),
}

/// Consumer-side counters (atomic)
#[derive(Debug, Default)]
struct ConsumerStats {
    cycles: AtomicU64,
    batches: AtomicU64,
    records: AtomicU64,
    downgraded: AtomicU64,
}

impl ConsumerStats {
    fn record(&self, summary: &PollSummary) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if summary.records > 0 {
            self.batches.fetch_add(1, Ordering::Relaxed);
            self.records
                .fetch_add(summary.records as u64, Ordering::Relaxed);
        }
        if summary.downgraded {
            self.downgraded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Snapshot of consumer statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStatsSnapshot {
    /// Poll cycles run
    pub cycles: u64,
    /// Non-empty batches delivered
    pub batches: u64,
    /// Records delivered
    pub records: u64,
    /// Failures downgraded to stream error events
    pub downgraded: u64,
}

/// Mock consumer handle
///
/// Owns the receiving half of the output stream, the started signal, the
/// cancellation token, and the poll loop's completion handle.
pub struct MockConsumer {
    events: mpsc::Receiver<PollEvent>,
    started: watch::Receiver<bool>,
    state: watch::Receiver<ConsumerState>,
    cancel: CancellationToken,
    stats: Arc<ConsumerStats>,
    task: JoinHandle<()>,
}

impl MockConsumer {
    /// Construct the consumer and spawn its poll loop
    ///
    /// Returns immediately; the loop's first iteration resolves the started
    /// signal.
    pub fn start(
        driver: SharedDriver,
        topics: Arc<TopicRegistry>,
        serdes: Arc<SerdeRegistry>,
        config: &TransportConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (started_tx, started_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConsumerState::NotStarted);
        let cancel = CancellationToken::new();
        let stats = Arc::new(ConsumerStats::default());

        let task = tokio::spawn(poll_loop(
            driver,
            topics,
            serdes,
            events_tx,
            started_tx,
            state_tx,
            cancel.clone(),
            config.poll_interval,
            stats.clone(),
        ));

        Self {
            events: events_rx,
            started: started_rx,
            state: state_rx,
            cancel,
            stats,
            task,
        }
    }

    /// Receive the next stream event; `None` once the poll loop has closed
    /// the stream
    pub async fn recv(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Wait until the poll loop has begun its first iteration
    pub async fn started(&mut self) -> Result<()> {
        self.started
            .wait_for(|started| *started)
            .await
            .map(|_| ())
            .map_err(|_| {
                TransportError::stream_closed("consumer terminated before its poll loop started")
            })
    }

    /// Request cooperative shutdown
    ///
    /// Observed at the next loop boundary; the output stream closes within
    /// roughly one poll interval.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("consumer stop requested");
            self.cancel.cancel();
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConsumerState {
        *self.state.borrow()
    }

    /// Snapshot of the consumer's counters
    pub fn stats(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            cycles: self.stats.cycles.load(Ordering::Relaxed),
            batches: self.stats.batches.load(Ordering::Relaxed),
            records: self.stats.records.load(Ordering::Relaxed),
            downgraded: self.stats.downgraded.load(Ordering::Relaxed),
        }
    }

    /// Await the poll loop's completion
    ///
    /// Drops the stream receiver first so a loop blocked on a full stream
    /// can observe cancellation instead of deadlocking against its awaiter.
    pub async fn join(self) -> Result<()> {
        let Self { events, task, .. } = self;
        drop(events);
        task.await.map_err(TransportError::from)
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    driver: SharedDriver,
    topics: Arc<TopicRegistry>,
    serdes: Arc<SerdeRegistry>,
    events: mpsc::Sender<PollEvent>,
    started: watch::Sender<bool>,
    state: watch::Sender<ConsumerState>,
    cancel: CancellationToken,
    poll_interval: Duration,
    stats: Arc<ConsumerStats>,
) {
    let mut first = true;
    while !cancel.is_cancelled() {
        if first {
            first = false;
            let _ = started.send(true);
            let _ = state.send(ConsumerState::Polling);
            debug!(
                interval_ms = poll_interval.as_millis() as u64,
                topics = topics.len(),
                "poll loop started"
            );
        }

        let summary = poll_cycle(&driver, &topics, &serdes, &events).await;
        stats.record(&summary);

        tokio::time::sleep(poll_interval).await;
    }

    let _ = state.send(ConsumerState::Stopping);
    // Closing the output stream is the loop's last visible effect
    drop(events);
    let _ = state.send(ConsumerState::Stopped);
    info!(
        cycles = stats.cycles.load(Ordering::Relaxed),
        records = stats.records.load(Ordering::Relaxed),
        "poll loop stopped"
    );
}
