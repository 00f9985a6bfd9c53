//! Wiring of the URL service with its telemetry queue and aggregator.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::UrlService;
use crate::domain::hit_aggregator::{Aggregator, AggregatorHandle, DEFAULT_IDLE_WAIT};
use crate::domain::hit_queue::{DEFAULT_QUEUE_CAPACITY, TelemetryQueue};
use crate::domain::repositories::ShortenedUrlRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub queue_capacity: usize,
    pub idle_wait: Duration,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }
}

/// Service plus the running aggregator that feeds on its lookups.
pub struct TelemetryPipeline<R: ShortenedUrlRepository + ?Sized> {
    pub service: Arc<UrlService<R>>,
    pub aggregator: AggregatorHandle,
}

impl<R: ShortenedUrlRepository + ?Sized + 'static> TelemetryPipeline<R> {
    /// Creates the queue, the service on top of `repository` and spawns the
    /// single aggregator consuming the queue.
    ///
    /// Must be called inside a Tokio runtime. The returned
    /// [`AggregatorHandle`] is owned by the caller, who is expected to call
    /// [`AggregatorHandle::shutdown`] when stopping.
    pub fn start(repository: Arc<R>, settings: TelemetrySettings) -> Self {
        let (queue, rx) = TelemetryQueue::bounded(settings.queue_capacity);
        let service = Arc::new(UrlService::new(repository, queue));
        let aggregator = Aggregator::new(service.clone(), settings.idle_wait).spawn(rx);

        tracing::info!(
            queue_capacity = settings.queue_capacity,
            idle_wait_ms = settings.idle_wait.as_millis() as u64,
            "Telemetry pipeline started"
        );

        Self {
            service,
            aggregator,
        }
    }
}
