//! API route configuration.

use crate::api::handlers::{shorten_handler, url_list_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST /shorten` - Create shortened URLs (batch-capable)
/// - `GET  /urls`    - List shortened URLs (paginated)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/urls", get(url_list_handler))
}
