//! Pure helpers used by the service and the admin CLI.
//!
//! - [`alias_codec`] - Content fingerprint and token encoding
//! - [`url_identity`] - URL validation and fingerprint content extraction

pub mod alias_codec;
pub mod url_identity;
