//! Validation of submitted URLs and extraction of their fingerprint content.

use url::Url;

/// Errors that can occur while validating a submitted URL.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL '{0}'")]
    InvalidFormat(String),

    #[error("Submitted URL must use http(s) scheme. Found: '{0}'")]
    UnsupportedScheme(String),
}

/// A submitted URL that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlIdentity {
    /// The URL exactly as submitted.
    pub full_url: String,
    /// Host, path and query (with its `?`), the input to the fingerprint.
    pub content: String,
}

/// Validates `input` and derives the content that identifies it.
///
/// # Rules
///
/// 1. Must parse as an absolute URI
/// 2. Scheme must be `http` or `https`
/// 3. Content is `host + path + query`; scheme, port, credentials and fragment
///    do not take part, so `http` and `https` variants share one alias
///
/// The host is the lowercased host from the parsed URL. Path and query are
/// taken verbatim from `input`, without dot-segment removal, percent-encoding
/// or backslash conversion. Trailing slashes and query parameter order are
/// kept as well: URLs that differ only in those are distinct inputs.
///
/// # Errors
///
/// Returns [`UrlValidationError::InvalidFormat`] for anything that is not an
/// absolute URI and [`UrlValidationError::UnsupportedScheme`] for schemes
/// other than http(s).
///
/// # Examples
///
/// ```ignore
/// let identity = parse_identity("https://ziglang.org/documentation/master/").unwrap();
/// assert_eq!(identity.content, "ziglang.org/documentation/master/");
/// ```
pub fn parse_identity(input: &str) -> Result<UrlIdentity, UrlValidationError> {
    let url = Url::parse(input).map_err(|_| UrlValidationError::InvalidFormat(input.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedScheme(input.to_string())),
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlValidationError::InvalidFormat(input.to_string()))?;

    let path_and_query = raw_path_and_query(input);

    let mut content = String::with_capacity(host.len() + path_and_query.len() + 1);
    content.push_str(host);
    if path_and_query.is_empty() || path_and_query.starts_with('?') {
        content.push('/');
    }
    content.push_str(path_and_query);

    Ok(UrlIdentity {
        full_url: input.to_string(),
        content,
    })
}

/// Path and query as written in `input`, fragment excluded.
///
/// Only called on input that already parsed as a special-scheme URL, so the
/// authority follows the scheme's `:` and any run of `/` or `\`.
fn raw_path_and_query(input: &str) -> &str {
    let trimmed = input.trim_matches(|c: char| c <= ' ');
    let after_scheme = trimmed.split_once(':').map_or(trimmed, |(_, rest)| rest);
    let authority = after_scheme.trim_start_matches(['/', '\\']);

    let start = authority
        .find(['/', '\\', '?', '#'])
        .unwrap_or(authority.len());
    let rest = &authority[start..];
    let end = rest.find('#').unwrap_or(rest.len());

    &rest[..end]
}
