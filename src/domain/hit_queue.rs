//! Bounded queue carrying hit events from lookups to the aggregator.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::hit_event::HitEvent;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Why an event did not make it onto the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("telemetry queue is closed")]
    Closed,
    #[error("enqueue cancelled while waiting for queue capacity")]
    Cancelled,
}

/// Producer side of the telemetry queue.
///
/// FIFO with a fixed capacity. When the queue is full, [`enqueue`] waits for
/// a free slot; that wait ends early if the caller's token is cancelled.
/// Cloning yields another producer for the same queue.
///
/// [`enqueue`]: TelemetryQueue::enqueue
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    tx: mpsc::Sender<HitEvent>,
}

impl TelemetryQueue {
    /// Creates a queue holding at most `capacity` events (at least one).
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<HitEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub async fn enqueue(
        &self,
        event: HitEvent,
        cancel: &CancellationToken,
    ) -> Result<(), EnqueueError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EnqueueError::Cancelled),
            sent = self.tx.send(event) => sent.map_err(|_| EnqueueError::Closed),
        }
    }

    /// `true` once the consumer side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots right now.
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}
