//! One poll cycle: drain available driver output onto the consumer stream.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::consumer::PollEvent;
use crate::driver::{SharedDriver, TopologyDriver};
use crate::pipeline;
use crate::serdes::SerdeRegistry;
use crate::topic::TopicRegistry;

/// Outcome of one poll cycle
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PollSummary {
    /// Records delivered onto the stream this cycle
    pub records: usize,
    /// Whether a failure was downgraded to a stream error event
    pub downgraded: bool,
}

/// Run one poll cycle against the driver.
///
/// For each registered topic, in registry iteration order, reads output
/// records until the driver reports none, decoding each through the consumer
/// pipeline. Topics that yielded nothing are dropped; the remaining per-topic
/// batches are concatenated and pushed as a single bulk [`PollEvent::Batch`].
/// A cycle that collected nothing produces no stream activity at all.
///
/// Failures never escape: a decode failure or a rejected enqueue is logged
/// and downgraded to a single best-effort [`PollEvent::Error`] so the owning
/// loop keeps running.
pub(crate) async fn poll_cycle(
    driver: &SharedDriver,
    topics: &TopicRegistry,
    serdes: &SerdeRegistry,
    out: &mpsc::Sender<PollEvent>,
) -> PollSummary {
    let mut batch = Vec::new();

    for (alias, spec) in topics.iter() {
        let before = batch.len();
        while let Some(record) = driver.read_next(&spec.name) {
            match pipeline::decode(topics, serdes, record) {
                Ok(message) => batch.push(message),
                Err(e) => {
                    warn!(topic = alias, error = %e, "poll cycle failed to decode a record");
                    let _ = out.send(PollEvent::Error(e.to_string())).await;
                    return PollSummary {
                        records: 0,
                        downgraded: true,
                    };
                }
            }
        }
        let drained = batch.len() - before;
        if drained > 0 {
            debug!(topic = alias, records = drained, "drained topic output");
        }
    }

    if batch.is_empty() {
        return PollSummary::default();
    }

    let records = batch.len();
    if out.send(PollEvent::Batch(batch)).await.is_err() {
        warn!(records, "consumer stream closed before the poll batch could be delivered");
        // Best effort: the stream that rejected the batch is already closed,
        // so this error event can only be dropped along with it.
        let _ = out.try_send(PollEvent::Error(
            "consumer stream closed during poll delivery".to_string(),
        ));
        return PollSummary {
            records: 0,
            downgraded: true,
        };
    }

    PollSummary {
        records,
        downgraded: false,
    }
}
