//! Alias and offset value types.

use std::fmt;

/// Number of bytes in an alias.
pub const ALIAS_LEN: usize = 16;

/// A 16-byte content fingerprint of a URL's host, path and query.
///
/// Not unique on its own: distinct URLs may share an alias and are told apart
/// by their [`Offset`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alias([u8; ALIAS_LEN]);

impl Alias {
    pub fn from_bytes(bytes: [u8; ALIAS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ALIAS_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, safe for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alias({})", self.to_hex())
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Raised when stored alias bytes are not exactly [`ALIAS_LEN`] long.
#[derive(Debug, thiserror::Error)]
#[error("alias must be {ALIAS_LEN} bytes, got {0}")]
pub struct InvalidAliasLength(pub usize);

impl TryFrom<&[u8]> for Alias {
    type Error = InvalidAliasLength;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; ALIAS_LEN] = value
            .try_into()
            .map_err(|_| InvalidAliasLength(value.len()))?;
        Ok(Self(bytes))
    }
}

/// Disambiguation slot for URLs sharing one alias, always in `0..=9`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset(u8);

impl Offset {
    /// Slots available per alias (one decimal digit).
    pub const SLOTS: usize = 10;

    pub const ZERO: Offset = Offset(0);

    pub fn new(value: u8) -> Option<Self> {
        (usize::from(value) < Self::SLOTS).then_some(Self(value))
    }

    /// Offset for the next row given how many rows already share the alias.
    pub fn from_count(count: usize) -> Option<Self> {
        u8::try_from(count).ok().and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn to_ascii_digit(self) -> u8 {
        b'0' + self.0
    }

    pub fn from_ascii_digit(byte: u8) -> Option<Self> {
        byte.is_ascii_digit().then(|| Self(byte - b'0'))
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i16> for Offset {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(value)
    }
}

impl From<Offset> for i16 {
    fn from(offset: Offset) -> Self {
        i16::from(offset.0)
    }
}
