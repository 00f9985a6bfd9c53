//! Alias codec: content fingerprinting and url-safe token encoding.
//!
//! A token is `alias ‖ offset-digit` (17 bytes) in standard base64, with the
//! three characters that are not url-safe swapped one-for-one:
//!
//! | base64 | token |
//! |--------|-------|
//! | `/`    | `_`   |
//! | `+`    | `.`   |
//! | `=`    | `~`   |
//!
//! All functions are pure.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};

use crate::domain::entities::{ALIAS_LEN, Alias, Offset};

/// Raw byte length of a token before base64.
pub const TOKEN_BYTES: usize = ALIAS_LEN + 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("content to fingerprint cannot be blank")]
    EmptyContent,

    #[error("alias '{0}' is not url-safe base64")]
    NotBase64(String),

    #[error("alias '{token}' decodes to {len} bytes instead of {TOKEN_BYTES}")]
    WrongLength { token: String, len: usize },

    #[error("last byte of alias '{0}' is not a decimal offset")]
    InvalidOffset(String),
}

/// Fingerprints `content` into a 16-byte alias.
///
/// The 128-bit MD5 digest is rendered as fixed-width ASCII: bytes above
/// 0x7F become `?`. MD5 is used as a content fingerprint only.
///
/// # Errors
///
/// Returns [`CodecError::EmptyContent`] for blank input.
pub fn fingerprint(content: &str) -> Result<Alias, CodecError> {
    if content.trim().is_empty() {
        return Err(CodecError::EmptyContent);
    }

    let digest = Md5::digest(content.as_bytes());
    let mut bytes = [0u8; ALIAS_LEN];
    for (slot, byte) in bytes.iter_mut().zip(digest.iter()) {
        *slot = if byte.is_ascii() { *byte } else { b'?' };
    }

    Ok(Alias::from_bytes(bytes))
}

/// Encodes an alias and offset into the externally visible token.
pub fn encode(alias: &Alias, offset: Offset) -> String {
    let mut raw = [0u8; TOKEN_BYTES];
    raw[..ALIAS_LEN].copy_from_slice(alias.as_bytes());
    raw[ALIAS_LEN] = offset.to_ascii_digit();

    STANDARD.encode(raw).chars().map(to_url_safe).collect()
}

/// Decodes a token back into its alias and offset.
///
/// # Errors
///
/// - [`CodecError::NotBase64`] if the token is not valid base64 once the
///   substitution is inverted; raw `/`, `+` and `=` pass through unchanged
/// - [`CodecError::WrongLength`] if it does not decode to exactly 17 bytes
/// - [`CodecError::InvalidOffset`] if the last byte is not an ASCII digit
pub fn decode(token: &str) -> Result<(Alias, Offset), CodecError> {
    let standard: String = token.chars().map(from_url_safe).collect();
    let raw = STANDARD
        .decode(standard.as_bytes())
        .map_err(|_| CodecError::NotBase64(token.to_string()))?;

    if raw.len() != TOKEN_BYTES {
        return Err(CodecError::WrongLength {
            token: token.to_string(),
            len: raw.len(),
        });
    }

    let offset = Offset::from_ascii_digit(raw[ALIAS_LEN])
        .ok_or_else(|| CodecError::InvalidOffset(token.to_string()))?;
    let alias = Alias::try_from(&raw[..ALIAS_LEN]).map_err(|e| CodecError::WrongLength {
        token: token.to_string(),
        len: e.0,
    })?;

    Ok((alias, offset))
}

fn to_url_safe(c: char) -> char {
    match c {
        '/' => '_',
        '+' => '.',
        '=' => '~',
        other => other,
    }
}

fn from_url_safe(c: char) -> char {
    match c {
        '_' => '/',
        '.' => '+',
        '~' => '=',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(bytes: &[u8; ALIAS_LEN]) -> Alias {
        Alias::from_bytes(*bytes)
    }

    fn url_safe_base64(raw: &[u8]) -> String {
        STANDARD.encode(raw).chars().map(to_url_safe).collect()
    }

    #[test]
    fn test_known_token_vector() {
        let alias = fingerprint("ziglang.org/documentation/master/").unwrap();
        assert_eq!(encode(&alias, Offset::ZERO), "Pw0_dBc_Pz9YPxtOPz8_NzA~");
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("example.org/a").unwrap();
        let b = fingerprint("example.org/a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_for_different_content() {
        let a = fingerprint("example.org/a").unwrap();
        let b = fingerprint("example.org/b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_is_ascii() {
        for content in ["example.org/a", "ziglang.org/", "rust-lang.org/learn?x=1"] {
            let alias = fingerprint(content).unwrap();
            assert!(alias.as_bytes().iter().all(u8::is_ascii));
        }
    }

    #[test]
    fn test_fingerprint_rejects_blank() {
        assert_eq!(fingerprint(""), Err(CodecError::EmptyContent));
        assert_eq!(fingerprint("   "), Err(CodecError::EmptyContent));
    }

    #[test]
    fn test_round_trip_every_offset() {
        let aliases = [
            alias(b"abcdefghijklmnop"),
            alias(b"????????????????"),
            alias(b"\0\r\n\t/+=~._-ABCDE"),
            fingerprint("example.org/a").unwrap(),
        ];

        for a in aliases {
            for o in 0..10u8 {
                let offset = Offset::new(o).unwrap();
                let token = encode(&a, offset);
                assert_eq!(decode(&token), Ok((a, offset)), "token {token}");
            }
        }
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = encode(&alias(b"\xff\xfe??>>>>????????"), Offset::new(3).unwrap());
        assert_eq!(token.len(), 24);
        assert!(!token.contains(['/', '+', '=']));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode("not-base64!!"),
            Err(CodecError::NotBase64(_))
        ));
        assert!(matches!(decode("as&10!*0"), Err(CodecError::NotBase64(_))));
    }

    #[test]
    fn test_decode_accepts_raw_base64_characters() {
        let issued = decode("Pw0_dBc_Pz9YPxtOPz8_NzA~").unwrap();
        assert_eq!(decode("Pw0/dBc/Pz9YPxtOPz8/NzA="), Ok(issued));
        assert_eq!(decode("Pw0_dBc/Pz9YPxtOPz8_NzA~"), Ok(issued));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let token = url_safe_base64(b"asdf");
        assert!(matches!(
            decode(&token),
            Err(CodecError::WrongLength { len: 4, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_digit_offset() {
        let token = url_safe_base64(b"abcdefghijklmnopq");
        assert!(matches!(decode(&token), Err(CodecError::InvalidOffset(_))));
    }

    #[test]
    fn test_decode_empty_token() {
        assert!(matches!(decode(""), Err(CodecError::WrongLength { len: 0, .. })));
    }
}
