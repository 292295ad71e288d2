//! Unified error types for roomwatch.
//!
//! Display strings carry a stable `SCREAMING_SNAKE` code prefix so callers
//! (and log scrapers) can classify failures without matching on variants.

use tokio_rusqlite::rusqlite;

/// Unified error type for the room-status core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No adapter claims the URL. The message lists the supported platforms.
    #[error("UNSUPPORTED_PLATFORM: {0}")]
    UnsupportedPlatform(String),

    /// An adapter could not derive a room identifier from the input.
    #[error("EXTRACTION_FAILED: {0}")]
    Extraction(String),

    /// A live-status probe returned a schema the adapter does not recognise.
    ///
    /// Soft failure: callers degrade the snapshot instead of aborting.
    #[error("LIVE_STATUS_UNAVAILABLE: {0}")]
    LiveStatusUnavailable(String),

    /// Invalid input parameters (e.g. an empty URL list).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Input could not be parsed as a URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A network call exceeded the request timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Transport-level HTTP failure (connect error, non-2xx status, body read).
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A persisted cache entry could not be decoded.
    ///
    /// Handled internally by the cache: the entry is deleted and treated as
    /// a miss, so this variant rarely escapes.
    #[error("CACHE_CORRUPT: {0}")]
    CacheCorrupt(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
