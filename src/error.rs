//! Error types for the APNs thin client.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for APNs client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for APNs client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or configuration failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid or malformed PEM certificate/key material.
    #[error("invalid TLS identity: {message}")]
    InvalidIdentity { message: String },

    /// JSON payload serialization exceeded APNs's 4096-byte limit.
    #[error("payload too large: {payload_size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { payload_size: usize, limit: usize },

    /// A custom payload key collided with the reserved `aps` namespace.
    #[error("custom payload key collides with reserved \"aps\" namespace")]
    ReservedCustomKey,

    /// Device token was not 64 hex characters / 32 bytes.
    #[error("invalid device token: expected 64 hex characters, got {len}")]
    InvalidToken { len: usize },

    /// DNS resolution for the gateway/feedback host failed.
    #[error("failed to resolve hostname '{hostname}': {message}")]
    DnsResolutionFailed { hostname: String, message: String },

    /// TCP connect did not complete within the configured timeout, after retries.
    #[error("connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A read returned fewer bytes than the protocol frame requires.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// A wire-format decode ran past the end of the available bytes.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Generic protocol-level decode error.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The FCM HTTP endpoint returned a non-success response.
    #[error("FCM request failed with status {status}: {body}")]
    FcmRejected { status: u16, body: String },

    /// Transport-level failure reaching the FCM HTTP endpoint.
    #[error("FCM request error: {0}")]
    FcmRequest(#[from] reqwest::Error),
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}
