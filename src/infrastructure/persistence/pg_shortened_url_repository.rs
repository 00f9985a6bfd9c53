//! PostgreSQL implementation of the shortened URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Alias, NewShortenedUrl, Offset, ShortenedUrl};
use crate::domain::repositories::ShortenedUrlRepository;
use crate::error::AppError;

const SELECT_COLUMNS: &str = r#"
    SELECT row_id, alias, alias_offset, url_safe_alias, full_url, created, hits, last_hit
    FROM shortened_urls
"#;

/// PostgreSQL repository for shortened URL rows.
///
/// Aliases are stored as `BYTEA`: fingerprint bytes may be control
/// characters, including NUL, which `TEXT` cannot hold.
pub struct PgShortenedUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortenedUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ShortenedUrlRecord {
    row_id: i64,
    alias: Vec<u8>,
    alias_offset: i16,
    url_safe_alias: String,
    full_url: String,
    created: DateTime<Utc>,
    hits: i64,
    last_hit: Option<DateTime<Utc>>,
}

impl TryFrom<ShortenedUrlRecord> for ShortenedUrl {
    type Error = AppError;

    fn try_from(r: ShortenedUrlRecord) -> Result<Self, Self::Error> {
        let alias = Alias::try_from(r.alias.as_slice())
            .map_err(|e| AppError::unexpected_from("Corrupt alias column", e))?;
        let offset = Offset::try_from(r.alias_offset).map_err(|value| {
            AppError::unexpected(
                "Corrupt alias_offset column",
                json!({ "row_id": r.row_id, "alias_offset": value }),
            )
        })?;

        Ok(ShortenedUrl {
            row_id: r.row_id,
            alias,
            offset,
            url_safe_alias: r.url_safe_alias,
            full_url: r.full_url,
            created: r.created,
            hits: r.hits,
            last_hit: r.last_hit,
        })
    }
}

fn into_rows(records: Vec<ShortenedUrlRecord>) -> Result<Vec<ShortenedUrl>, AppError> {
    records.into_iter().map(ShortenedUrl::try_from).collect()
}

#[async_trait]
impl ShortenedUrlRepository for PgShortenedUrlRepository {
    async fn find_by_alias(&self, alias: &Alias) -> Result<Vec<ShortenedUrl>, AppError> {
        let query = format!("{SELECT_COLUMNS} WHERE alias = $1 ORDER BY alias_offset");
        let records = sqlx::query_as::<_, ShortenedUrlRecord>(&query)
            .bind(alias.as_bytes().as_slice())
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| {
                AppError::from(e).trace(
                    "pg_shortened_url_repository::find_by_alias",
                    format!("Failed to fetch rows with alias {alias}"),
                )
            })?;

        into_rows(records)
    }

    async fn find_by_id(&self, row_id: i64) -> Result<Option<ShortenedUrl>, AppError> {
        let query = format!("{SELECT_COLUMNS} WHERE row_id = $1");
        let record = sqlx::query_as::<_, ShortenedUrlRecord>(&query)
            .bind(row_id)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| {
                AppError::from(e).trace(
                    "pg_shortened_url_repository::find_by_id",
                    format!("Failed to fetch row {row_id}"),
                )
            })?;

        record.map(ShortenedUrl::try_from).transpose()
    }

    async fn insert(&self, new_row: NewShortenedUrl) -> Result<ShortenedUrl, AppError> {
        let record = sqlx::query_as::<_, ShortenedUrlRecord>(
            r#"
            INSERT INTO shortened_urls (alias, alias_offset, url_safe_alias, full_url, created)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING row_id, alias, alias_offset, url_safe_alias, full_url, created, hits, last_hit
            "#,
        )
        .bind(new_row.alias.as_bytes().as_slice())
        .bind(i16::from(new_row.offset))
        .bind(&new_row.url_safe_alias)
        .bind(&new_row.full_url)
        .bind(new_row.created)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            AppError::from(e).trace(
                "pg_shortened_url_repository::insert",
                format!(
                    "Failed to insert row with alias '{}' (actual: {}, offset: {}) from url '{}'",
                    new_row.url_safe_alias, new_row.alias, new_row.offset, new_row.full_url
                ),
            )
        })?;

        tracing::debug!(
            row_id = record.row_id,
            token = %new_row.url_safe_alias,
            alias = %new_row.alias,
            offset = %new_row.offset,
            "Inserted shortened url"
        );

        ShortenedUrl::try_from(record)
    }

    async fn update(&self, row: &ShortenedUrl) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE shortened_urls
            SET alias = $2, alias_offset = $3, url_safe_alias = $4, full_url = $5,
                created = $6, hits = $7, last_hit = $8
            WHERE row_id = $1
            "#,
        )
        .bind(row.row_id)
        .bind(row.alias.as_bytes().as_slice())
        .bind(i16::from(row.offset))
        .bind(&row.url_safe_alias)
        .bind(&row.full_url)
        .bind(row.created)
        .bind(row.hits)
        .bind(row.last_hit)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| {
            AppError::from(e).trace(
                "pg_shortened_url_repository::update",
                format!("Failed to update row {}", row.row_id),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                format!("Row with row id {} was not found.", row.row_id),
                json!({ "row_id": row.row_id }),
            ));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shortened_urls")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ShortenedUrl>, AppError> {
        let query = format!("{SELECT_COLUMNS} ORDER BY row_id DESC LIMIT $1 OFFSET $2");
        let records = sqlx::query_as::<_, ShortenedUrlRecord>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        into_rows(records)
    }
}
