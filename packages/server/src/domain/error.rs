//! Domain errors.

use thiserror::Error;

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),
}

/// Errors raised while pushing an envelope to a client connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),
}

/// Errors reported by an overlay network provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("Overlay handle has been destroyed")]
    Destroyed,

    #[error("Peer stream is closed")]
    StreamClosed,

    #[error("Failed to join topic: {0}")]
    JoinFailed(String),

    #[error("Overlay provider error: {0}")]
    Provider(String),
}

/// Reasons a peer frame is dropped
#[derive(Debug, Error)]
pub enum PeerFrameError {
    #[error("peer frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("peer frame is not a JSON object")]
    NotAnObject,
}
