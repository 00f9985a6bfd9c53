//! In-process implementation of the shortened URL repository.

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::entities::{Alias, NewShortenedUrl, ShortenedUrl};
use crate::domain::repositories::ShortenedUrlRepository;
use crate::error::AppError;

/// Row store kept in process memory.
///
/// Enforces the same `(alias, offset)` uniqueness as the PostgreSQL schema.
/// Used with `STORAGE_BACKEND=memory` and by integration tests; contents are
/// lost on restart.
#[derive(Default)]
pub struct InMemoryShortenedUrlRepository {
    rows: RwLock<Vec<ShortenedUrl>>,
}

impl InMemoryShortenedUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `rows`, keeping their ids.
    pub fn with_rows(rows: Vec<ShortenedUrl>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Snapshot of all stored rows, oldest first.
    pub async fn snapshot(&self) -> Vec<ShortenedUrl> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl ShortenedUrlRepository for InMemoryShortenedUrlRepository {
    async fn find_by_alias(&self, alias: &Alias) -> Result<Vec<ShortenedUrl>, AppError> {
        let rows = self.rows.read().await;
        let mut found: Vec<ShortenedUrl> = rows.iter().filter(|r| r.alias == *alias).cloned().collect();
        found.sort_by_key(|r| r.offset);
        Ok(found)
    }

    async fn find_by_id(&self, row_id: i64) -> Result<Option<ShortenedUrl>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| r.row_id == row_id).cloned())
    }

    async fn insert(&self, new_row: NewShortenedUrl) -> Result<ShortenedUrl, AppError> {
        let mut rows = self.rows.write().await;

        if rows
            .iter()
            .any(|r| r.alias == new_row.alias && r.offset == new_row.offset)
        {
            return Err(AppError::unexpected(
                "Unique constraint violation",
                json!({ "constraint": "shortened_urls_alias_offset_key" }),
            )
            .trace(
                "memory_shortened_url_repository::insert",
                format!(
                    "Row with alias {} and offset {} already exists",
                    new_row.alias, new_row.offset
                ),
            ));
        }

        let row_id = rows.iter().map(|r| r.row_id).max().unwrap_or(0) + 1;
        let row = new_row.into_row(row_id);
        rows.push(row.clone());

        Ok(row)
    }

    async fn update(&self, row: &ShortenedUrl) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;

        match rows.iter_mut().find(|r| r.row_id == row.row_id) {
            Some(stored) => {
                *stored = row.clone();
                Ok(())
            }
            None => Err(AppError::not_found(
                format!("Row with row id {} was not found.", row.row_id),
                json!({ "row_id": row.row_id }),
            )),
        }
    }

    async fn count(&self) -> Result<i64, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.len() as i64)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ShortenedUrl>, AppError> {
        let rows = self.rows.read().await;
        let skip = usize::try_from(offset).unwrap_or(0);
        let take = usize::try_from(limit).unwrap_or(0);

        let mut newest_first: Vec<&ShortenedUrl> = rows.iter().collect();
        newest_first.sort_by(|a, b| b.row_id.cmp(&a.row_id));

        Ok(newest_first.into_iter().skip(skip).take(take).cloned().collect())
    }
}
