#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use url_alias::application::services::UrlService;
use url_alias::application::telemetry_pipeline::{TelemetryPipeline, TelemetrySettings};
use url_alias::domain::hit_aggregator::AggregatorState;
use url_alias::domain::hit_event::HitEvent;
use url_alias::domain::hit_queue::TelemetryQueue;
use url_alias::domain::repositories::ShortenedUrlRepository;
use url_alias::infrastructure::persistence::InMemoryShortenedUrlRepository;
use url_alias::state::AppState;

pub const BASE_URL: &str = "http://s.test";

/// State over an in-memory store with no aggregator running; hit events
/// stay in the returned receiver.
pub fn create_test_state() -> (
    AppState,
    Arc<InMemoryShortenedUrlRepository>,
    mpsc::Receiver<HitEvent>,
) {
    let repo = Arc::new(InMemoryShortenedUrlRepository::new());
    let dyn_repo: Arc<dyn ShortenedUrlRepository> = repo.clone();
    let (queue, rx) = TelemetryQueue::bounded(100);
    let (_state_tx, state_rx) = watch::channel(AggregatorState::Idle);

    let state = AppState::new(Arc::new(UrlService::new(dyn_repo, queue)), BASE_URL, state_rx);

    (state, repo, rx)
}

/// State over an in-memory store with a running aggregator.
pub fn create_pipeline_state() -> (
    AppState,
    Arc<InMemoryShortenedUrlRepository>,
    TelemetryPipeline<dyn ShortenedUrlRepository>,
) {
    let repo = Arc::new(InMemoryShortenedUrlRepository::new());
    let dyn_repo: Arc<dyn ShortenedUrlRepository> = repo.clone();

    let pipeline = TelemetryPipeline::start(
        dyn_repo,
        TelemetrySettings {
            queue_capacity: 100,
            idle_wait: Duration::from_millis(10),
        },
    );

    let state = AppState::new(
        pipeline.service.clone(),
        BASE_URL,
        pipeline.aggregator.subscribe(),
    );

    (state, repo, pipeline)
}

/// Polls the store until the row has `hits` hits, or gives up after ~2s.
pub async fn wait_for_hits(repo: &InMemoryShortenedUrlRepository, row_id: i64, hits: i64) -> bool {
    for _ in 0..200 {
        if let Ok(Some(row)) = repo.find_by_id(row_id).await
            && row.hits >= hits
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
