//! Error types for semdex.
//!
//! One enum covers the whole library so callers can match on the class
//! of a failure: storage (`NotFound`, `Corrupt`), ingestion
//! (`EmptyContent`, `UnsupportedFileType`), and remote provider calls
//! (`RateLimited`, `Timeout`, `ConnectionFailed`, `Provider`). The
//! provider classes matter for retry decisions — see
//! [`Error::is_transient`] and the [`retry`](crate::retry) module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for semdex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting, caching, or searching documents.
#[derive(Error, Debug)]
pub enum Error {
    /// No record exists for the given document id.
    #[error("no document found with id '{0}'")]
    NotFound(String),

    /// A persisted record exists but could not be parsed.
    ///
    /// Distinct from [`Error::NotFound`] so recovery logic can tell
    /// "absent" from "present but unreadable".
    #[error("corrupt record '{id}': {reason}")]
    Corrupt { id: String, reason: String },

    /// Text extraction produced nothing usable for this file.
    #[error("no text could be extracted from {}", .0.display())]
    EmptyContent(PathBuf),

    /// The file extension maps to no known extraction path.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The provider rejected the request with HTTP 429. Transient.
    #[error("provider rate limit: {0}")]
    RateLimited(String),

    /// The provider request timed out. Transient.
    #[error("provider request timed out: {0}")]
    Timeout(String),

    /// The provider could not be reached at the connection level. Transient.
    #[error("provider connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other provider failure (auth, malformed request, server
    /// error). Not retried.
    #[error("provider error: {0}")]
    Provider(String),

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure writing a record or snapshot.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a retry wrapper may attempt this call again.
    ///
    /// Only the provider failure classes that tend to clear on their
    /// own qualify; everything else propagates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::RateLimited(_) | Error::Timeout(_) | Error::ConnectionFailed(_)
        )
    }
}
