//! Typed errors for the Mumble client.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while establishing or running a Mumble session.
#[derive(Debug, Error)]
pub enum MumbleError {
    /// Socket level failure (connect, read, write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration or handshake failure
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Client certificate or key could not be loaded
    #[error("certificate error ({path}): {reason}")]
    Certificate { path: PathBuf, reason: String },

    /// Server address could not be parsed or resolved
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// Server refused the authentication attempt
    #[error("connection rejected: {reason}")]
    Rejected { reason: String },

    /// Peer violated the framing or message contract
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Protobuf payload could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Session is no longer connected
    #[error("session closed")]
    Closed,
}

/// Result type alias for Mumble operations.
pub type Result<T> = std::result::Result<T, MumbleError>;
