//! DTOs for the shortened URL listing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::ShortenedUrl;

/// Paginated list of shortened URLs.
#[derive(Debug, Serialize)]
pub struct UrlListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<UrlListItem>,
}

#[derive(Debug, Serialize)]
pub struct UrlListItem {
    pub row_id: i64,
    pub token: String,
    pub short_url: String,
    pub full_url: String,
    pub offset: u8,
    pub created: DateTime<Utc>,
    pub hits: i64,
    pub last_hit: Option<DateTime<Utc>>,
}

impl UrlListItem {
    pub fn from_row(row: ShortenedUrl, short_url: String) -> Self {
        Self {
            row_id: row.row_id,
            token: row.url_safe_alias,
            short_url,
            full_url: row.full_url,
            offset: row.offset.get(),
            created: row.created,
            hits: row.hits,
            last_hit: row.last_hit,
        }
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, page_size: u32, total_items: i64) -> Self {
        let size = i64::from(page_size.max(1));
        let total_pages = u32::try_from((total_items.max(0) + size - 1) / size).unwrap_or(u32::MAX);

        Self {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}
