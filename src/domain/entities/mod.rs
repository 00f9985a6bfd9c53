//! Core domain entities.
//!
//! - [`ShortenedUrl`] - A persisted URL mapping
//! - [`Alias`] / [`Offset`] - The two halves of a row's identity
//!
//! As elsewhere in the domain, creation uses a separate struct
//! ([`NewShortenedUrl`]) that lacks the store-assigned id.

pub mod alias;
pub mod shortened_url;

pub use alias::{ALIAS_LEN, Alias, InvalidAliasLength, Offset};
pub use shortened_url::{NewShortenedUrl, ShortenedUrl};
