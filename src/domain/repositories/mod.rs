//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ShortenedUrlRepository`] - Shortened URL rows, keyed by id and alias

pub mod shortened_url_repository;

pub use shortened_url_repository::ShortenedUrlRepository;

#[cfg(test)]
pub use shortened_url_repository::MockShortenedUrlRepository;
