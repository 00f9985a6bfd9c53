//! Handler for token redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, ErrorKind};
use crate::state::AppState;

/// Redirects a token to its full URL.
///
/// # Endpoint
///
/// `GET /{token}`
///
/// # Hit Tracking
///
/// The lookup queues a hit event; the row's counter is updated in the
/// background. If the request is abandoned while the queue is full, the hit
/// is dropped.
///
/// # Errors
///
/// Returns 404 Not Found if the token does not resolve.
/// Returns 400 Bad Request for a blank token.
pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let full_url = state
        .url_service
        .lookup(&token, &cancel)
        .await
        .inspect_err(|e| {
            if e.kind() == ErrorKind::Unexpected {
                tracing::error!(
                    token = %token,
                    error = %e.message(),
                    trail = %e.trail(),
                    "Lookup failed"
                );
            }
        })?;

    Ok(Redirect::temporary(&full_url))
}
