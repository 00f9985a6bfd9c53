//! Handler for listing shortened URLs.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;

use crate::api::dto::pagination::PaginationParams;
use crate::api::dto::urls::{PaginationMeta, UrlListItem, UrlListResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Lists stored URLs, newest first.
///
/// # Endpoint
///
/// `GET /api/urls`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, 10 to 1000)
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn url_list_handler(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<UrlListResponse>, AppError> {
    let (offset, limit) = params
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::client(e, json!({})))?;

    let (rows, total_items) = state.url_service.list(offset, limit).await?;

    let items = rows
        .into_iter()
        .map(|row| {
            let short_url = state.short_url(&row.url_safe_alias);
            UrlListItem::from_row(row, short_url)
        })
        .collect();

    Ok(Json(UrlListResponse {
        pagination: PaginationMeta::new(params.page(), params.page_size(), total_items),
        items,
    }))
}
