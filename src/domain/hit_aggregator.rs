//! Background consumer that applies hit events to the row store.
//!
//! Exactly one [`Aggregator`] runs per service. It drains the
//! [`crate::domain::hit_queue::TelemetryQueue`] one event at a time, so the
//! read-modify-write of a row's counter never races with itself.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::hit_event::HitEvent;
use crate::error::{AppError, ErrorKind};
use crate::metrics::METRICS;

pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(500);

/// Applies one hit event to storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HitRecorder: Send + Sync {
    async fn record_hit(&self, event: HitEvent) -> Result<(), AppError>;
}

/// Observable state of the aggregator task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Waiting for the next event.
    Idle,
    /// Applying an event.
    Processing,
    /// The loop has exited and will not consume again.
    Stopped,
}

impl AggregatorState {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregatorState::Idle => "idle",
            AggregatorState::Processing => "processing",
            AggregatorState::Stopped => "stopped",
        }
    }
}

pub struct Aggregator<H: HitRecorder> {
    recorder: Arc<H>,
    idle_wait: Duration,
}

impl<H: HitRecorder + 'static> Aggregator<H> {
    pub fn new(recorder: Arc<H>, idle_wait: Duration) -> Self {
        Self {
            recorder,
            idle_wait,
        }
    }

    /// Spawns the consumer loop on the runtime and returns its handle.
    pub fn spawn(self, rx: mpsc::Receiver<HitEvent>) -> AggregatorHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(AggregatorState::Idle);
        let join = tokio::spawn(self.run(rx, cancel.clone(), state_tx));

        tracing::info!("Hit aggregator started");

        AggregatorHandle {
            cancel,
            join,
            state: state_rx,
        }
    }

    /// Consumer loop.
    ///
    /// Cancellation is only observed between events; an event that is being
    /// applied always runs to completion unless the task is aborted.
    ///
    /// The loop also ends when every sender is dropped. Under
    /// [`crate::application::telemetry_pipeline::TelemetryPipeline`] that
    /// cannot happen while the task runs, since the recorder it holds owns the
    /// queue's sender, so [`AggregatorHandle::shutdown`] is the only way out
    /// there. Callers wiring their own channel rely on the closed exit.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<HitEvent>,
        cancel: CancellationToken,
        state: watch::Sender<AggregatorState>,
    ) {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Hit aggregator cancelled");
                    break;
                }
                next = tokio::time::timeout(self.idle_wait, rx.recv()) => next,
            };

            match next {
                Err(_) => {
                    state.send_replace(AggregatorState::Idle);
                }
                Ok(None) => {
                    tracing::info!("Telemetry queue closed, hit aggregator exiting");
                    break;
                }
                Ok(Some(event)) => {
                    state.send_replace(AggregatorState::Processing);
                    self.apply(event).await;
                    state.send_replace(AggregatorState::Idle);
                }
            }
        }

        state.send_replace(AggregatorState::Stopped);
    }

    async fn apply(&self, event: HitEvent) {
        match self.recorder.record_hit(event).await {
            Ok(()) => {
                METRICS.hits_recorded_total.inc();
                tracing::debug!(row_id = event.row_id, "Hit recorded");
            }
            Err(e) => {
                METRICS.hits_failed_total.inc();
                if e.kind() == ErrorKind::NotFound {
                    tracing::warn!(
                        row_id = event.row_id,
                        error = %e.message(),
                        trail = %e.trail(),
                        "Discarding hit for missing row"
                    );
                } else {
                    tracing::error!(
                        row_id = event.row_id,
                        error = %e.message(),
                        trail = %e.trail(),
                        "Failed to record hit"
                    );
                }
            }
        }
    }
}

/// Owner's handle on a running aggregator.
pub struct AggregatorHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    state: watch::Receiver<AggregatorState>,
}

impl AggregatorHandle {
    pub fn state(&self) -> AggregatorState {
        *self.state.borrow()
    }

    /// A receiver that follows state changes, for health reporting.
    pub fn subscribe(&self) -> watch::Receiver<AggregatorState> {
        self.state.clone()
    }

    /// Stops the aggregator.
    ///
    /// Signals cancellation, then waits up to `grace` for the in-flight event
    /// to finish. Past the grace period the task is aborted. Events still in
    /// the queue are not drained.
    pub async fn shutdown(mut self, grace: Duration) {
        self.cancel.cancel();

        match tokio::time::timeout(grace, &mut self.join).await {
            Ok(Ok(())) => tracing::info!("Hit aggregator stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Hit aggregator task failed"),
            Err(_) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Hit aggregator did not stop within grace period, aborting"
                );
                self.join.abort();
                let _ = self.join.await;
            }
        }
    }
}
