//! Error types for the request executor.
//!
//! # Design
//! The transport never signals failures through panics or distinct error
//! types per cause. It returns a `TransportError` tagged with a `FailureKind`,
//! and the retry loop switches on that kind. Only `Connect` and
//! `ConnectTimeout` are transient; everything else ends the call on first
//! occurrence.

use thiserror::Error;

/// Classification of a failed transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP framing or protocol violation.
    Protocol,
    /// The peer certificate could not be verified.
    Certificate,
    /// The connection could not be established (refused, unreachable).
    Connect,
    /// The connection was not established within the connect timeout.
    ConnectTimeout,
    /// Any other I/O failure, including failures while reading a body.
    Io,
}

impl FailureKind {
    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Connect | FailureKind::ConnectTimeout)
    }
}

/// A classified failure returned by a `TransportClient`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind:?} failure: {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The response body was present but is not a JSON object.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Errors raised by a `FlagStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("flag store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("flag store contents are invalid: {0}")]
    Format(#[from] serde_json::Error),

    #[error("flag store lock poisoned")]
    Poisoned,
}

/// Why a call ended in a terminal failure.
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A synchronous call received a response without an entity.
    #[error("response carried no entity")]
    MissingEntity,
}
