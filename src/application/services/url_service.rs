//! Shortened URL creation, resolution and hit recording.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::{NewShortenedUrl, Offset, ShortenedUrl};
use crate::domain::hit_aggregator::HitRecorder;
use crate::domain::hit_event::HitEvent;
use crate::domain::hit_queue::TelemetryQueue;
use crate::domain::repositories::ShortenedUrlRepository;
use crate::error::AppError;
use crate::metrics::METRICS;
use crate::utils::alias_codec::{self, CodecError};
use crate::utils::url_identity::parse_identity;

/// Core service behind the HTTP surface.
///
/// Creation is deterministic: a URL always maps to the alias of its host,
/// path and query, and the first ten distinct URLs sharing an alias get
/// offsets 0 through 9. Lookups feed the telemetry queue; hit counts are
/// applied later by the aggregator through [`HitRecorder`].
pub struct UrlService<R: ShortenedUrlRepository + ?Sized> {
    repository: Arc<R>,
    queue: TelemetryQueue,
}

impl<R: ShortenedUrlRepository + ?Sized> UrlService<R> {
    pub fn new(repository: Arc<R>, queue: TelemetryQueue) -> Self {
        Self { repository, queue }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn queue(&self) -> &TelemetryQueue {
        &self.queue
    }

    /// Creates (or returns the existing) shortened URL for `url`.
    ///
    /// # Collision Handling
    ///
    /// - Same URL already stored under the alias: that row is returned as-is
    /// - Otherwise the next free offset is taken (`offset = rows with alias`)
    /// - Ten rows already share the alias: [`AppError::CollisionExhausted`]
    ///
    /// Concurrent creators racing for the same slot are not retried; the
    /// loser gets the store's unique violation as [`AppError::Unexpected`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Client`] if the URL is not absolute http(s).
    /// Returns [`AppError::CollisionExhausted`] if all ten slots are used.
    /// Returns [`AppError::Cancelled`] if `cancel` fires first.
    /// Returns [`AppError::Unexpected`] on store or codec failure.
    pub async fn create(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ShortenedUrl, AppError> {
        let identity = parse_identity(url).map_err(|e| {
            tracing::debug!(url, error = %e, "Rejected url");
            AppError::client(e.to_string(), json!({ "url": url }))
        })?;

        let alias = alias_codec::fingerprint(&identity.content).map_err(|e| {
            codec_failure(e).trace(
                "url_service::create",
                format!("Failed to fingerprint content of '{url}'"),
            )
        })?;

        let rows = until_cancelled(cancel, self.repository.find_by_alias(&alias))
            .await
            .map_err(|e| {
                e.trace(
                    "url_service::create",
                    format!("Failed to fetch rows for alias {alias} from url '{url}'"),
                )
            })?;

        let Some(offset) = Offset::from_count(rows.len()) else {
            METRICS.collisions_exhausted_total.inc();
            tracing::error!(
                severity = "critical",
                alias = %alias,
                url,
                rows = rows.len(),
                "All alias offsets are taken"
            );
            return Err(AppError::collision_exhausted(
                format!("Alias collision slots exhausted for url '{url}'"),
                json!({ "alias": alias.to_hex() }),
            ));
        };

        if let Some(existing) = rows.into_iter().find(|r| r.full_url == identity.full_url) {
            tracing::debug!(row_id = existing.row_id, "Url already shortened");
            return Ok(existing);
        }

        let new_row = NewShortenedUrl {
            alias,
            offset,
            url_safe_alias: alias_codec::encode(&alias, offset),
            full_url: identity.full_url,
            created: Utc::now(),
        };

        let row = until_cancelled(cancel, self.repository.insert(new_row))
            .await
            .map_err(|e| {
                e.trace(
                    "url_service::create",
                    format!("Failed to insert url '{url}' at offset {offset}"),
                )
            })?;

        tracing::info!(
            row_id = row.row_id,
            token = %row.url_safe_alias,
            offset = %row.offset,
            "Shortened url created"
        );

        Ok(row)
    }

    /// Resolves `token` to its full URL and queues a hit for the row.
    ///
    /// A hit that cannot be queued (queue closed, or `cancel` fired while
    /// waiting for capacity) is logged and dropped; the lookup still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Client`] for a blank token.
    /// Returns [`AppError::NotFound`] if the token does not decode or no row
    /// matches its alias and offset.
    /// Returns [`AppError::Cancelled`] if `cancel` fires during the store call.
    /// Returns [`AppError::Unexpected`] on store failure.
    pub async fn lookup(&self, token: &str, cancel: &CancellationToken) -> Result<String, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::client("Token must not be blank", json!({})));
        }

        let (alias, offset) = alias_codec::decode(token).map_err(|e| {
            tracing::debug!(token, error = %e, "Undecodable token");
            AppError::not_found(
                format!("Token '{token}' does not decode"),
                json!({ "token": token }),
            )
        })?;

        let rows = until_cancelled(cancel, self.repository.find_by_alias(&alias))
            .await
            .map_err(|e| {
                e.trace(
                    "url_service::lookup",
                    format!("Failed to fetch rows for token '{token}'"),
                )
            })?;

        let row = rows
            .into_iter()
            .find(|r| r.offset == offset)
            .ok_or_else(|| {
                AppError::not_found(
                    format!("No row for alias {alias} at offset {offset}"),
                    json!({ "token": token }),
                )
            })?;

        match self.queue.enqueue(HitEvent::now(row.row_id), cancel).await {
            Ok(()) => {
                METRICS.hits_enqueued_total.inc();
            }
            Err(e) => {
                tracing::warn!(row_id = row.row_id, error = %e, "Dropped hit event");
            }
        }

        Ok(row.full_url)
    }

    /// Resolves `token` without recording a hit.
    ///
    /// # Errors
    ///
    /// Same as [`Self::lookup`].
    pub async fn inspect(&self, token: &str) -> Result<ShortenedUrl, AppError> {
        let (alias, offset) = alias_codec::decode(token).map_err(|e| {
            AppError::not_found(
                format!("Token '{token}' does not decode"),
                json!({ "token": token, "reason": e.to_string() }),
            )
        })?;

        self.repository
            .find_by_alias(&alias)
            .await?
            .into_iter()
            .find(|r| r.offset == offset)
            .ok_or_else(|| {
                AppError::not_found(
                    format!("No row for alias {alias} at offset {offset}"),
                    json!({ "token": token }),
                )
            })
    }

    /// Applies one hit: `hits + 1` and `last_hit = event.hit_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the row no longer exists.
    /// Returns [`AppError::Unexpected`] on store failure.
    pub async fn record_hit(&self, event: HitEvent) -> Result<(), AppError> {
        let row = self
            .repository
            .find_by_id(event.row_id)
            .await
            .map_err(|e| {
                e.trace(
                    "url_service::record_hit",
                    format!("Failed to load row {}", event.row_id),
                )
            })?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Row with row id {} was not found.", event.row_id),
                    json!({ "row_id": event.row_id }),
                )
            })?;

        let updated = row.with_hit(event.hit_at);

        self.repository.update(&updated).await.map_err(|e| {
            e.trace(
                "url_service::record_hit",
                format!("Failed to update hits of row {}", event.row_id),
            )
        })
    }

    /// Lists rows newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unexpected`] on store failure.
    pub async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<ShortenedUrl>, i64), AppError> {
        let rows = self.repository.list(offset, limit).await?;
        let total = self.repository.count().await?;
        Ok((rows, total))
    }
}

#[async_trait]
impl<R: ShortenedUrlRepository + ?Sized> HitRecorder for UrlService<R> {
    async fn record_hit(&self, event: HitEvent) -> Result<(), AppError> {
        UrlService::record_hit(self, event).await
    }
}

/// Races `fut` against `cancel`; dropping `fut` aborts the store call.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::cancelled("Operation cancelled by caller")),
        result = fut => result,
    }
}

fn codec_failure(e: CodecError) -> AppError {
    AppError::unexpected_from("Alias codec failure", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Alias;
    use crate::domain::repositories::MockShortenedUrlRepository;
    use crate::error::ErrorKind;
    use mockall::predicate::eq;
    use tokio::sync::mpsc;

    const ZIG_URL: &str = "https://ziglang.org/documentation/master/";
    const ZIG_TOKEN: &str = "Pw0_dBc_Pz9YPxtOPz8_NzA~";

    fn zig_alias() -> Alias {
        alias_codec::fingerprint("ziglang.org/documentation/master/").unwrap()
    }

    fn stored_row(row_id: i64, alias: Alias, offset: u8, full_url: &str) -> ShortenedUrl {
        let offset = Offset::new(offset).unwrap();
        NewShortenedUrl {
            alias,
            offset,
            url_safe_alias: alias_codec::encode(&alias, offset),
            full_url: full_url.to_string(),
            created: Utc::now(),
        }
        .into_row(row_id)
    }

    fn service(
        repo: MockShortenedUrlRepository,
    ) -> (UrlService<MockShortenedUrlRepository>, mpsc::Receiver<HitEvent>) {
        let (queue, rx) = TelemetryQueue::bounded(16);
        (UrlService::new(Arc::new(repo), queue), rx)
    }

    fn store_down() -> AppError {
        AppError::unexpected("Database error", json!({}))
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().never();
        let (service, _rx) = service(repo);

        let err = service
            .create("not a url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[tokio::test]
    async fn test_create_rejects_non_http_scheme() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().never();
        let (service, _rx) = service(repo);

        let err = service
            .create("ftp://example.com/file", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Client);
        assert!(err.message().contains("http(s)"));
    }

    #[tokio::test]
    async fn test_create_inserts_first_row_at_offset_zero() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .with(eq(zig_alias()))
            .times(1)
            .returning(|_| Ok(vec![]));
        repo.expect_insert()
            .withf(|n| n.offset == Offset::ZERO && n.full_url == ZIG_URL)
            .times(1)
            .returning(|n| Ok(n.into_row(1)));
        let (service, _rx) = service(repo);

        let row = service
            .create(ZIG_URL, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(row.row_id, 1);
        assert_eq!(row.url_safe_alias, ZIG_TOKEN);
    }

    #[tokio::test]
    async fn test_create_returns_existing_row_for_same_url() {
        let alias = zig_alias();
        let existing = stored_row(5, alias, 0, ZIG_URL);
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .returning(move |_| Ok(vec![existing.clone()]));
        repo.expect_insert().never();
        let (service, _rx) = service(repo);

        let row = service
            .create(ZIG_URL, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(row.row_id, 5);
        assert_eq!(row.url_safe_alias, ZIG_TOKEN);
    }

    #[tokio::test]
    async fn test_create_takes_next_offset_for_other_scheme() {
        let alias = zig_alias();
        let existing = stored_row(5, alias, 0, ZIG_URL);
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .returning(move |_| Ok(vec![existing.clone()]));
        repo.expect_insert()
            .withf(|n| n.offset.get() == 1)
            .times(1)
            .returning(|n| Ok(n.into_row(6)));
        let (service, _rx) = service(repo);

        let row = service
            .create("http://ziglang.org/documentation/master/", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(row.alias, alias);
        assert_eq!(row.offset.get(), 1);
        assert_ne!(row.url_safe_alias, ZIG_TOKEN);
    }

    #[tokio::test]
    async fn test_create_fails_when_all_offsets_taken() {
        let alias = zig_alias();
        let rows: Vec<ShortenedUrl> = (0..10)
            .map(|i| stored_row(i64::from(i) + 1, alias, i, &format!("{ZIG_URL}#{i}")))
            .collect();
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .returning(move |_| Ok(rows.clone()));
        repo.expect_insert().never();
        let (service, _rx) = service(repo);

        let err = service
            .create("http://ziglang.org/documentation/master/", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CollisionExhausted);
    }

    #[tokio::test]
    async fn test_create_wraps_fetch_failure() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().returning(|_| Err(store_down()));
        repo.expect_insert().never();
        let (service, _rx) = service(repo);

        let err = service
            .create(ZIG_URL, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.trail().entries().len(), 1);
        assert_eq!(err.trail().entries()[0].location, "url_service::create");
    }

    #[tokio::test]
    async fn test_create_wraps_insert_failure() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().returning(|_| Ok(vec![]));
        repo.expect_insert().times(1).returning(|_| Err(store_down()));
        let (service, _rx) = service(repo);

        let err = service
            .create(ZIG_URL, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(!err.trail().is_empty());
    }

    #[tokio::test]
    async fn test_create_cancelled_before_store_call() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().returning(|_| Ok(vec![]));
        repo.expect_insert().never();
        let (service, _rx) = service(repo);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service.create(ZIG_URL, &cancel).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_lookup_blank_token_is_client_error() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().never();
        let (service, _rx) = service(repo);

        for token in ["", "   "] {
            let err = service
                .lookup(token, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Client);
        }
    }

    #[tokio::test]
    async fn test_lookup_undecodable_token_is_not_found() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().never();
        let (service, _rx) = service(repo);

        let err = service
            .lookup("not-base64!!", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_unknown_alias_is_not_found() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias().returning(|_| Ok(vec![]));
        let (service, mut rx) = service(repo);

        let err = service
            .lookup(ZIG_TOKEN, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lookup_wrong_offset_is_not_found() {
        let alias = zig_alias();
        let other = stored_row(9, alias, 1, "http://ziglang.org/documentation/master/");
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .returning(move |_| Ok(vec![other.clone()]));
        let (service, _rx) = service(repo);

        let err = service
            .lookup(ZIG_TOKEN, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_returns_url_and_enqueues_one_hit() {
        let alias = zig_alias();
        let row = stored_row(3, alias, 0, ZIG_URL);
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .with(eq(alias))
            .returning(move |_| Ok(vec![row.clone()]));
        let (service, mut rx) = service(repo);
        let before = Utc::now();

        let url = service
            .lookup(ZIG_TOKEN, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(url, ZIG_URL);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.row_id, 3);
        assert!(event.hit_at >= before);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lookup_succeeds_when_queue_closed() {
        let alias = zig_alias();
        let row = stored_row(3, alias, 0, ZIG_URL);
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_alias()
            .returning(move |_| Ok(vec![row.clone()]));
        let (service, rx) = service(repo);
        drop(rx);

        let url = service
            .lookup(ZIG_TOKEN, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(url, ZIG_URL);
    }

    #[tokio::test]
    async fn test_record_hit_missing_row_is_not_found() {
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_id().with(eq(42)).returning(|_| Ok(None));
        repo.expect_update().never();
        let (service, _rx) = service(repo);

        let err = service.record_hit(HitEvent::now(42)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Row with row id 42 was not found.");
    }

    #[tokio::test]
    async fn test_record_hit_wraps_update_failure() {
        let row = stored_row(3, zig_alias(), 0, ZIG_URL);
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(row.clone())));
        repo.expect_update().times(1).returning(|_| Err(store_down()));
        let (service, _rx) = service(repo);

        let err = service.record_hit(HitEvent::now(3)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.trail().entries()[0].location, "url_service::record_hit");
    }

    #[tokio::test]
    async fn test_record_hit_increments_and_stamps() {
        let row = stored_row(3, zig_alias(), 0, ZIG_URL);
        let event = HitEvent::now(3);
        let hit_at = event.hit_at;
        let mut repo = MockShortenedUrlRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(row.clone())));
        repo.expect_update()
            .withf(move |r| r.hits == 1 && r.last_hit == Some(hit_at))
            .times(1)
            .returning(|_| Ok(()));
        let (service, _rx) = service(repo);

        service.record_hit(event).await.unwrap();
    }
}
