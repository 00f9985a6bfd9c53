//! Repository trait for shortened URL rows.

use crate::domain::entities::{Alias, NewShortenedUrl, ShortenedUrl};
use crate::error::AppError;
use async_trait::async_trait;

/// Keyed row store holding [`ShortenedUrl`] rows.
///
/// The store is the only shared mutable resource of the service. Each call is
/// atomic on its own; nothing here is transactional across calls.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortenedUrlRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::InMemoryShortenedUrlRepository`] - process memory
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortenedUrlRepository: Send + Sync {
    /// Returns every row whose alias equals `alias`, in offset order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unexpected`] on storage errors.
    async fn find_by_alias(&self, alias: &Alias) -> Result<Vec<ShortenedUrl>, AppError>;

    /// Finds a row by its id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unexpected`] on storage errors.
    async fn find_by_id(&self, row_id: i64) -> Result<Option<ShortenedUrl>, AppError>;

    /// Inserts a row and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unexpected`] if the `(alias, offset)` pair is taken
    /// or on storage errors.
    async fn insert(&self, new_row: NewShortenedUrl) -> Result<ShortenedUrl, AppError>;

    /// Replaces the stored row that has the same `row_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no row has this id.
    /// Returns [`AppError::Unexpected`] on storage errors.
    async fn update(&self, row: &ShortenedUrl) -> Result<(), AppError>;

    /// Counts all rows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unexpected`] on storage errors.
    async fn count(&self) -> Result<i64, AppError>;

    /// Lists rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unexpected`] on storage errors.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ShortenedUrl>, AppError>;
}
