//! Row store implementations.
//!
//! # Repositories
//!
//! - [`PgShortenedUrlRepository`] - PostgreSQL storage via SQLx
//! - [`InMemoryShortenedUrlRepository`] - Process-local storage for development and tests

pub mod memory_shortened_url_repository;
pub mod pg_shortened_url_repository;

pub use memory_shortened_url_repository::InMemoryShortenedUrlRepository;
pub use pg_shortened_url_repository::PgShortenedUrlRepository;
