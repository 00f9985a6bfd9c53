//! PostgreSQL row store tests. Need a database (`DATABASE_URL`); run with
//! `cargo test -- --ignored`.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use url_alias::domain::entities::{NewShortenedUrl, Offset};
use url_alias::domain::repositories::ShortenedUrlRepository;
use url_alias::error::ErrorKind;
use url_alias::infrastructure::persistence::PgShortenedUrlRepository;
use url_alias::utils::alias_codec::{encode, fingerprint};

fn new_row(content: &str, offset: u8, url: &str) -> NewShortenedUrl {
    let alias = fingerprint(content).unwrap();
    let offset = Offset::new(offset).unwrap();
    NewShortenedUrl {
        alias,
        offset,
        url_safe_alias: encode(&alias, offset),
        full_url: url.to_string(),
        created: Utc::now(),
    }
}

#[sqlx::test]
#[ignore]
async fn test_insert_and_find_by_alias(pool: PgPool) {
    let repo = PgShortenedUrlRepository::new(Arc::new(pool));

    let inserted = repo
        .insert(new_row(
            "ziglang.org/documentation/master/",
            0,
            "https://ziglang.org/documentation/master/",
        ))
        .await
        .unwrap();

    assert!(inserted.row_id > 0);
    assert_eq!(inserted.url_safe_alias, "Pw0_dBc_Pz9YPxtOPz8_NzA~");
    assert_eq!(inserted.hits, 0);
    assert!(inserted.last_hit.is_none());

    let found = repo.find_by_alias(&inserted.alias).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].alias, inserted.alias);
    assert_eq!(found[0].full_url, inserted.full_url);
}

#[sqlx::test]
#[ignore]
async fn test_alias_with_control_bytes_round_trips(pool: PgPool) {
    let repo = PgShortenedUrlRepository::new(Arc::new(pool));
    // Digest bytes below 0x20 survive the BYTEA column unchanged.
    let row = new_row("ziglang.org/documentation/master/", 0, "https://ziglang.org/documentation/master/");
    assert!(row.alias.as_bytes().iter().any(|b| *b < 0x20));

    let inserted = repo.insert(row).await.unwrap();
    let found = repo.find_by_id(inserted.row_id).await.unwrap().unwrap();

    assert_eq!(found.alias, inserted.alias);
}

#[sqlx::test]
#[ignore]
async fn test_duplicate_alias_offset_is_unexpected(pool: PgPool) {
    let repo = PgShortenedUrlRepository::new(Arc::new(pool));
    repo.insert(new_row("example.com/", 0, "https://example.com/"))
        .await
        .unwrap();

    let err = repo
        .insert(new_row("example.com/", 0, "http://example.com/"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(err.message(), "Unique constraint violation");
    assert!(!err.trail().is_empty());
}

#[sqlx::test]
#[ignore]
async fn test_update_and_missing_row(pool: PgPool) {
    let repo = PgShortenedUrlRepository::new(Arc::new(pool));
    let row = repo
        .insert(new_row("example.com/", 0, "https://example.com/"))
        .await
        .unwrap();

    let hit_at = Utc::now();
    repo.update(&row.clone().with_hit(hit_at)).await.unwrap();

    let stored = repo.find_by_id(row.row_id).await.unwrap().unwrap();
    assert_eq!(stored.hits, 1);
    assert!(stored.last_hit.is_some());

    let mut ghost = row;
    ghost.row_id = 999_999;
    let err = repo.update(&ghost).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test]
#[ignore]
async fn test_count_and_list_newest_first(pool: PgPool) {
    let repo = PgShortenedUrlRepository::new(Arc::new(pool));
    for i in 0..3 {
        let content = format!("example.com/{i}");
        repo.insert(new_row(&content, 0, &format!("https://{content}")))
            .await
            .unwrap();
    }

    assert_eq!(repo.count().await.unwrap(), 3);

    let page = repo.list(0, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0].row_id > page[1].row_id);
    assert_eq!(page[0].full_url, "https://example.com/2");
}
