//! Application error type shared by the core and the HTTP layer.
//!
//! Every error carries an [`ErrorKind`] category, a message, optional JSON
//! details and a [`Trail`] of `(location, message)` entries appended each time
//! the error is re-wrapped on its way up. The trail and the source error are
//! for logs only; [`IntoResponse`] never exposes them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::error::Error as StdError;
use std::fmt;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error category, used for logging policy and HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or disallowed input.
    Client,
    /// The token cannot be resolved.
    NotFound,
    /// All ten disambiguation slots of an alias are taken.
    CollisionExhausted,
    /// The caller cancelled the operation.
    Cancelled,
    /// Store or codec failure that should not normally occur.
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Client => "client_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CollisionExhausted => "collision_exhausted",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

/// One step of an error's provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailEntry {
    pub location: &'static str,
    pub message: String,
}

/// Append-only provenance chain, oldest entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trail(Vec<TrailEntry>);

impl Trail {
    pub fn entries(&self) -> &[TrailEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, location: &'static str, message: String) {
        self.0.push(TrailEntry { location, message });
    }
}

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" <- ")?;
            }
            write!(f, "{}: {}", entry.location, entry.message)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum AppError {
    Client {
        message: String,
        details: Value,
        trail: Trail,
    },
    NotFound {
        message: String,
        details: Value,
        trail: Trail,
    },
    CollisionExhausted {
        message: String,
        details: Value,
        trail: Trail,
    },
    Cancelled {
        message: String,
        trail: Trail,
    },
    Unexpected {
        message: String,
        details: Value,
        trail: Trail,
        source: Option<BoxError>,
    },
}

impl AppError {
    pub fn client(message: impl Into<String>, details: Value) -> Self {
        Self::Client {
            message: message.into(),
            details,
            trail: Trail::default(),
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
            trail: Trail::default(),
        }
    }

    pub fn collision_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::CollisionExhausted {
            message: message.into(),
            details,
            trail: Trail::default(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
            trail: Trail::default(),
        }
    }

    pub fn unexpected(message: impl Into<String>, details: Value) -> Self {
        Self::Unexpected {
            message: message.into(),
            details,
            trail: Trail::default(),
            source: None,
        }
    }

    /// Builds an [`AppError::Unexpected`] that keeps `source` as its cause.
    pub fn unexpected_from<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Unexpected {
            message: message.into(),
            details: json!({}),
            trail: Trail::default(),
            source: Some(source.into()),
        }
    }

    /// Appends a provenance entry and returns the error.
    pub fn trace(mut self, location: &'static str, message: impl Into<String>) -> Self {
        self.trail_mut().push(location, message.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Client { .. } => ErrorKind::Client,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::CollisionExhausted { .. } => ErrorKind::CollisionExhausted,
            AppError::Cancelled { .. } => ErrorKind::Cancelled,
            AppError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Client { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::CollisionExhausted { message, .. }
            | AppError::Cancelled { message, .. }
            | AppError::Unexpected { message, .. } => message,
        }
    }

    pub fn trail(&self) -> &Trail {
        match self {
            AppError::Client { trail, .. }
            | AppError::NotFound { trail, .. }
            | AppError::CollisionExhausted { trail, .. }
            | AppError::Cancelled { trail, .. }
            | AppError::Unexpected { trail, .. } => trail,
        }
    }

    fn trail_mut(&mut self) -> &mut Trail {
        match self {
            AppError::Client { trail, .. }
            | AppError::NotFound { trail, .. }
            | AppError::CollisionExhausted { trail, .. }
            | AppError::Cancelled { trail, .. }
            | AppError::Unexpected { trail, .. } => trail,
        }
    }

    /// Status code and the message shown to end users.
    ///
    /// Internal failures collapse into one generic message.
    fn public_parts(&self) -> (StatusCode, String, Value) {
        const TRY_AGAIN: &str = "Something went wrong on our end, please try again later";

        match self {
            AppError::Client {
                message, details, ..
            } => (StatusCode::BAD_REQUEST, message.clone(), details.clone()),
            AppError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                "The shortened url does not exist".to_string(),
                json!({}),
            ),
            AppError::Cancelled { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                TRY_AGAIN.to_string(),
                json!({}),
            ),
            AppError::CollisionExhausted { .. } | AppError::Unexpected { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                TRY_AGAIN.to_string(),
                json!({}),
            ),
        }
    }

    /// Public error information for embedding in batch responses.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, message, details) = self.public_parts();
        ErrorInfo {
            code: self.kind().as_str(),
            message,
            details,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind().as_str(), self.message())?;
        if !self.trail().is_empty() {
            write!(f, " --> {}", self.trail())?;
        }
        Ok(())
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Unexpected {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        let details = match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                json!({ "constraint": db.constraint() })
            }
            _ => json!({}),
        };

        let message = if details.get("constraint").is_some() {
            "Unique constraint violation"
        } else {
            "Database error"
        };

        AppError::Unexpected {
            message: message.to_string(),
            details,
            trail: Trail::default(),
            source: Some(Box::new(e)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _, _) = self.public_parts();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::client("Request validation failed", json!({ "fields": e.to_string() }))
    }
}
