//! Handler for the shortening endpoint.

use axum::{Json, extract::State};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::api::dto::shorten::{BatchSummary, ShortenRequest, ShortenResponse, ShortenResultItem};
use crate::error::{AppError, ErrorKind};
use crate::state::AppState;

/// Creates shortened URLs for one or more URLs.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Batch Processing
///
/// Processes URLs independently. If one fails, others continue processing.
/// Each result includes either success data or error information. Submitting
/// a URL that is already stored returns its existing token.
///
/// # Request Body
///
/// ```json
/// {
///   "urls": [
///     { "url": "https://ziglang.org/documentation/master/" }
///   ]
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "summary": { "total": 1, "successful": 1, "failed": 0 },
///   "items": [
///     {
///       "full_url": "https://ziglang.org/documentation/master/",
///       "token": "Pw0_dBc_Pz9YPxtOPz8_NzA~",
///       "short_url": "http://localhost:3000/Pw0_dBc_Pz9YPxtOPz8_NzA~",
///       "row_id": 1
///     }
///   ]
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the body fails validation.
/// Individual URL errors are returned in the response items array.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let total = payload.urls.len();
    let mut results = Vec::with_capacity(total);
    let mut successful = 0;
    let mut failed = 0;

    for item in payload.urls {
        match state.url_service.create(&item.url, &cancel).await {
            Ok(row) => {
                successful += 1;
                results.push(ShortenResultItem::Success {
                    short_url: state.short_url(&row.url_safe_alias),
                    token: row.url_safe_alias,
                    row_id: row.row_id,
                    full_url: item.url,
                });
            }
            Err(err) => {
                log_item_error(&item.url, &err);
                failed += 1;
                results.push(ShortenResultItem::Error {
                    error: err.to_error_info(),
                    full_url: item.url,
                });
            }
        }
    }

    Ok(Json(ShortenResponse {
        summary: BatchSummary {
            total,
            successful,
            failed,
        },
        items: results,
    }))
}

fn log_item_error(url: &str, err: &AppError) {
    match err.kind() {
        ErrorKind::Client => tracing::debug!(url, error = %err.message(), "Rejected url"),
        ErrorKind::Cancelled => tracing::debug!(url, "Shortening cancelled"),
        _ => tracing::error!(
            url,
            error = %err.message(),
            trail = %err.trail(),
            "Failed to shorten url"
        ),
    }
}
