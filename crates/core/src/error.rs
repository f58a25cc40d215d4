//! Error types for the MJPEG client library.

use std::fmt;
use std::io;

/// Errors that can occur while opening or reading an MJPEG stream.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Setup**: [`InvalidUrl`](Self::InvalidUrl) — the endpoint URL could not be parsed.
/// - **Transport**: [`Connection`](Self::Connection) — connect/timeout failures,
///   peer resets, or a stream that ended before the handshake completed.
/// - **Handshake**: [`Protocol`](Self::Protocol) — the response never announced
///   a usable multipart boundary.
/// - **Extraction**: [`Format`](Self::Format),
///   [`TruncatedFrame`](Self::TruncatedFrame), [`Decode`](Self::Decode).
///
/// None of these are retried internally. Reconnecting is up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum MjpegError {
    /// The URL is not of the form `http://[user:pass@]host[:port]/path[?query]`.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Underlying socket error, timeout, or premature end of stream.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// The HTTP response preamble did not describe a multipart stream.
    #[error("protocol error: {kind}")]
    Protocol { kind: ProtocolErrorKind },

    /// A chunk's `Content-Length` was missing, non-numeric, or too large.
    #[error("format error: {0}")]
    Format(String),

    /// The peer closed the stream before the declared frame length arrived.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// Frame bytes were received but could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl MjpegError {
    /// Stream closed by the peer while `stage` was still in progress.
    pub(crate) fn premature_end(stage: &str) -> Self {
        MjpegError::Connection(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream ended prematurely while {stage}"),
        ))
    }
}

/// Specific kind of handshake failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// Response headers ended without a `Content-Type: multipart/...` line.
    MissingBoundary,
    /// A multipart content type was announced but carried no `boundary=` token.
    MalformedContentType,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBoundary => write!(f, "no multipart content type in response"),
            Self::MalformedContentType => write!(f, "multipart content type has no boundary"),
        }
    }
}

/// A JPEG decoder rejected the bytes of a frame.
///
/// Kept separate from [`MjpegError`] because a decode failure does not end
/// the read: the [`Frame`](crate::Frame) still carries the raw bytes.
#[derive(Debug, Clone, thiserror::Error)]
#[error("JPEG decode error: {0}")]
pub struct DecodeError(pub String);

/// Convenience alias for `Result<T, MjpegError>`.
pub type Result<T> = std::result::Result<T, MjpegError>;
