//! Error types shared between client and server.
//!
//! The `ScreenerError` enum carries the three failure kinds a screener call can
//! report to its caller (source outage, malformed data, bad filter input) next to
//! the ambient I/O, serialization and locking failures, so every crate can
//! propagate a single error type.
use std::io;
use std::sync::PoisonError;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum ScreenerError {
    /// The primary or a secondary quote source could not be reached, answered with a
    /// non-success status, or returned a body that could not be decoded.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A row lacks its symbol, repeats a symbol, or carries a numeric field that
    /// cannot be cast after normalization.
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    /// A supplied filter bound cannot be parsed as a number.
    #[error("Filter parameter error: {0}")]
    FilterParameter(String),

    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

/// Coarse error category reported to clients next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ErrorKind {
    /// See [`ScreenerError::SourceUnavailable`].
    SourceUnavailable,
    /// See [`ScreenerError::MalformedRow`].
    MalformedRow,
    /// See [`ScreenerError::FilterParameter`].
    FilterParameterError,
    /// Any failure that is not part of the data pipeline itself.
    Internal,
}

impl ScreenerError {
    /// Category of this error as seen by a client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScreenerError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            ScreenerError::MalformedRow(_) => ErrorKind::MalformedRow,
            ScreenerError::FilterParameter(_) => ErrorKind::FilterParameterError,
            _ => ErrorKind::Internal,
        }
    }
}

impl<T> From<PoisonError<T>> for ScreenerError {
    fn from(err: PoisonError<T>) -> Self {
        ScreenerError::MutexLock(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_their_kind() {
        assert_eq!(
            ScreenerError::SourceUnavailable("down".into()).kind(),
            ErrorKind::SourceUnavailable
        );
        assert_eq!(
            ScreenerError::MalformedRow("dup".into()).kind(),
            ErrorKind::MalformedRow
        );
        assert_eq!(
            ScreenerError::FilterParameter("abc".into()).kind(),
            ErrorKind::FilterParameterError
        );
        assert_eq!(ScreenerError::Format("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn kind_displays_as_its_name() {
        assert_eq!(ErrorKind::FilterParameterError.to_string(), "FilterParameterError");
    }
}
