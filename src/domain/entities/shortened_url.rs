//! Shortened URL entity.

use chrono::{DateTime, Utc};

use crate::domain::entities::{Alias, Offset};

/// One persisted mapping from a submitted URL to its alias, offset and token.
///
/// Rows are append-only: only `hits` and `last_hit` change after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortenedUrl {
    pub row_id: i64,
    pub alias: Alias,
    pub offset: Offset,
    pub url_safe_alias: String,
    pub full_url: String,
    pub created: DateTime<Utc>,
    pub hits: i64,
    pub last_hit: Option<DateTime<Utc>>,
}

impl ShortenedUrl {
    /// Returns the row with one more hit, last seen at `hit_at`.
    pub fn with_hit(mut self, hit_at: DateTime<Utc>) -> Self {
        self.hits = self.hits.saturating_add(1);
        self.last_hit = Some(hit_at);
        self
    }
}

/// Input data for inserting a row; the store assigns `row_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortenedUrl {
    pub alias: Alias,
    pub offset: Offset,
    pub url_safe_alias: String,
    pub full_url: String,
    pub created: DateTime<Utc>,
}

impl NewShortenedUrl {
    /// Materializes the row as the store returns it after insert.
    pub fn into_row(self, row_id: i64) -> ShortenedUrl {
        ShortenedUrl {
            row_id,
            alias: self.alias,
            offset: self.offset,
            url_safe_alias: self.url_safe_alias,
            full_url: self.full_url,
            created: self.created,
            hits: 0,
            last_hit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_row() -> NewShortenedUrl {
        NewShortenedUrl {
            alias: Alias::from_bytes(*b"abcdefghijklmnop"),
            offset: Offset::ZERO,
            url_safe_alias: "token".to_string(),
            full_url: "https://example.org/a".to_string(),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_into_row_starts_without_hits() {
        let row = new_row().into_row(42);

        assert_eq!(row.row_id, 42);
        assert_eq!(row.hits, 0);
        assert!(row.last_hit.is_none());
        assert_eq!(row.full_url, "https://example.org/a");
    }

    #[test]
    fn test_with_hit_increments_and_stamps() {
        let hit_at = Utc::now();
        let row = new_row().into_row(1).with_hit(hit_at).with_hit(hit_at);

        assert_eq!(row.hits, 2);
        assert_eq!(row.last_hit, Some(hit_at));
    }

    #[test]
    fn test_with_hit_saturates() {
        let mut row = new_row().into_row(1);
        row.hits = i64::MAX;

        assert_eq!(row.with_hit(Utc::now()).hits, i64::MAX);
    }
}
