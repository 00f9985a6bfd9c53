//! Handler for the Prometheus scrape endpoint.

use axum::http::header;
use axum::response::IntoResponse;
use prometheus::{Encoder, TextEncoder};

use crate::error::AppError;
use crate::metrics::METRICS;

/// Exports all counters in Prometheus text format.
///
/// # Endpoint
///
/// `GET /metrics`
pub async fn metrics_handler() -> Result<impl IntoResponse, AppError> {
    let body = METRICS.export().map_err(|e| {
        AppError::unexpected_from("Failed to encode metrics", e)
            .trace("metrics_handler", "export failed")
    })?;

    Ok((
        [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
        body,
    ))
}
