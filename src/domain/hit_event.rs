//! Hit event model for asynchronous usage tracking.

use chrono::{DateTime, Utc};

/// One successful lookup, waiting to be applied to its row.
///
/// Produced by [`crate::application::services::UrlService::lookup`] and
/// consumed by the [`crate::domain::hit_aggregator::Aggregator`], which
/// increments the row's hit counter and sets its last hit time to `hit_at`.
/// Keeping the write off the request path lets redirects answer without
/// waiting on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    pub row_id: i64,
    pub hit_at: DateTime<Utc>,
}

impl HitEvent {
    pub fn new(row_id: i64, hit_at: DateTime<Utc>) -> Self {
        Self { row_id, hit_at }
    }

    /// Event for `row_id` stamped with the current time.
    pub fn now(row_id: i64) -> Self {
        Self::new(row_id, Utc::now())
    }
}
