use std::sync::Arc;
use tokio::sync::watch;

use crate::application::services::UrlService;
use crate::domain::hit_aggregator::AggregatorState;
use crate::domain::repositories::ShortenedUrlRepository;

#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService<dyn ShortenedUrlRepository>>,
    pub base_url: String,
    pub aggregator_state: watch::Receiver<AggregatorState>,
}

impl AppState {
    pub fn new(
        url_service: Arc<UrlService<dyn ShortenedUrlRepository>>,
        base_url: impl Into<String>,
        aggregator_state: watch::Receiver<AggregatorState>,
    ) -> Self {
        Self {
            url_service,
            base_url: base_url.into(),
            aggregator_state,
        }
    }

    /// Public URL that redirects to the row behind `token`.
    pub fn short_url(&self, token: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), token)
    }
}
