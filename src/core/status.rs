//! # Feed Status
//!
//! The value a UI observes for each feed. Every fetch publishes `Loading`
//! first, then exactly one of `Success` or `Error`.

use std::fmt;

use crate::news::SourceError;

/// Why a fetch attempt ended without new data.
///
/// Every variant is terminal for that attempt only. Retrying means calling
/// the fetch operation again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The connectivity check failed before any request was made.
    NoConnection,
    /// The request failed at the transport level.
    NetworkFailure,
    /// The response could not be decoded.
    ConversionError,
    /// The server answered with an error; carries its message.
    Server(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NoConnection => write!(f, "No internet connection"),
            FetchError::NetworkFailure => write!(f, "Network Failure"),
            FetchError::ConversionError => write!(f, "Conversion error"),
            FetchError::Server(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<SourceError> for FetchError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Network(_) => FetchError::NetworkFailure,
            SourceError::Parse(_) => FetchError::ConversionError,
            SourceError::Api { message, .. } => FetchError::Server(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status<T> {
    Loading,
    Success(T),
    Error(FetchError),
}

impl<T> Status<T> {
    /// The payload of a `Success`, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Status::Success(data) => Some(data),
            _ => None,
        }
    }

    /// The user-facing message of an `Error`, if any.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Status::Error(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
