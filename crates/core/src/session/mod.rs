//! MJPEG stream sessions.
//!
//! A [`StreamSession`] is the sole owner of one connection to a camera. It is
//! created by the handshake ([`handshake`]) and then yields frames one at a
//! time through the extractor ([`extractor`]):
//!
//! ```text
//! open(url)      -> connect, GET, learn boundary + skip_lines
//! next_frame()   -> Some(frame)   (repeat)
//! next_frame()   -> None          (peer closed the stream)
//! ```
//!
//! Everything is blocking and single-threaded. Every socket read is bounded by
//! the configured timeout, and another thread can interrupt a blocked read
//! through a [`ShutdownHandle`]. Nothing is retried; reconnecting after an
//! error is left to the caller.
//!
//! Note: the handshake probes into the first part to find its JPEG marker,
//! so the first frame returned is the second part sent by the server.

pub mod extractor;
pub mod handshake;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::decoder::{FrameDecoder, JpegDecoder};
use crate::endpoint::Endpoint;
use crate::error::{DecodeError, MjpegError, Result};
use crate::transport::{ShutdownHandle, StreamReader, tcp};

pub use handshake::Handshake;

/// Default connect/read timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default upper bound on a single frame's declared `Content-Length`.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Client-side configuration for opening a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connect timeout, and the bound on every later read or write.
    pub timeout: Duration,
    /// Frames declaring more bytes than this fail with
    /// [`MjpegError::Format`] instead of being allocated.
    pub max_frame_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// One frame pulled from the stream.
///
/// The raw bytes are always present, even when decoding failed, so callers
/// can log or persist what the camera actually sent.
#[derive(Debug)]
pub struct Frame<I> {
    pub data: Vec<u8>,
    pub image: std::result::Result<I, DecodeError>,
}

impl<I> Frame<I> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The decoded image, if decoding succeeded.
    pub fn image(&self) -> Option<&I> {
        self.image.as_ref().ok()
    }

    pub fn into_image(self) -> Result<I> {
        self.image.map_err(MjpegError::from)
    }
}

/// An open MJPEG stream.
///
/// Owns the connection exclusively: the socket is never shared with another
/// reader, and the read cursor only moves forward. `boundary` and
/// `skip_lines` are fixed for the session's lifetime.
///
/// Logging happens inside a per-session `tracing` span (`mjpeg` with host,
/// port and path), so events from concurrent sessions stay attributable under
/// whichever subscriber the caller installed.
pub struct StreamSession<S = TcpStream, D = JpegDecoder> {
    reader: StreamReader<S>,
    decoder: D,
    boundary: Vec<u8>,
    skip_lines: i32,
    max_frame_len: usize,
    frames_read: u64,
    /// Set by a [`ShutdownHandle`]; turns every later read into `ConnectionAborted`.
    cancelled: Arc<AtomicBool>,
    span: tracing::Span,
}

impl StreamSession<TcpStream, JpegDecoder> {
    /// Connect to `url` and negotiate the stream, decoding frames with
    /// [`JpegDecoder`].
    pub fn open(url: &str, timeout_secs: u64) -> Result<Self> {
        let config = ClientConfig {
            timeout: Duration::from_secs(timeout_secs),
            ..ClientConfig::default()
        };
        Self::open_with_config(url, &config, JpegDecoder)
    }
}

impl<D: FrameDecoder> StreamSession<TcpStream, D> {
    pub fn open_with_config(url: &str, config: &ClientConfig, decoder: D) -> Result<Self> {
        let endpoint = Endpoint::parse(url)?;
        let span = session_span(&endpoint);

        let stream = span.in_scope(|| {
            tracing::info!(timeout = ?config.timeout, "connecting");
            tcp::connect(&endpoint, config.timeout)
        })?;

        Self::negotiate(stream, &endpoint, config, decoder, span)
    }

    /// A handle that can interrupt this session's socket from another thread.
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        ShutdownHandle::new(self.reader.get_ref(), self.cancelled.clone())
    }

    /// Shut down and drop the connection.
    pub fn close(self) -> Result<()> {
        let _enter = self.span.enter();
        tracing::info!(frames = self.frames_read, "closing session");
        tcp::shutdown(self.reader.get_ref())
    }
}

impl<S: Read + Write, D: FrameDecoder> StreamSession<S, D> {
    /// Run the handshake over an already-connected stream.
    pub fn handshake(
        stream: S,
        endpoint: &Endpoint,
        config: &ClientConfig,
        decoder: D,
    ) -> Result<Self> {
        Self::negotiate(stream, endpoint, config, decoder, session_span(endpoint))
    }

    fn negotiate(
        stream: S,
        endpoint: &Endpoint,
        config: &ClientConfig,
        decoder: D,
        span: tracing::Span,
    ) -> Result<Self> {
        let mut reader = StreamReader::new(stream);

        let result = span.in_scope(|| handshake::negotiate(&mut reader, endpoint));
        let hs = match result {
            Ok(hs) => hs,
            Err(e) => {
                span.in_scope(|| tracing::warn!(error = %e, "handshake failed"));
                return Err(e);
            }
        };

        span.in_scope(|| {
            tracing::info!(
                boundary = %String::from_utf8_lossy(&hs.boundary),
                skip_lines = hs.skip_lines,
                "stream negotiated"
            )
        });

        Ok(StreamSession {
            reader,
            decoder,
            boundary: hs.boundary,
            skip_lines: hs.skip_lines,
            max_frame_len: config.max_frame_len,
            frames_read: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            span,
        })
    }
}

impl<S: Read, D: FrameDecoder> StreamSession<S, D> {
    /// Wrap a stream positioned after a handshake performed elsewhere.
    pub fn from_parts(
        stream: S,
        boundary: impl Into<Vec<u8>>,
        skip_lines: i32,
        decoder: D,
    ) -> Self {
        StreamSession {
            reader: StreamReader::new(stream),
            decoder,
            boundary: boundary.into(),
            skip_lines,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            frames_read: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            span: tracing::info_span!("mjpeg"),
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Read and decode the next frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream. A decode
    /// failure is not an error here: it is reported inside the [`Frame`].
    /// After a [`ShutdownHandle::shutdown`], every call fails with a
    /// `ConnectionAborted` connection error, whatever the read returned.
    pub fn next_frame(&mut self) -> Result<Option<Frame<D::Image>>> {
        let _enter = self.span.enter();

        if self.is_cancelled() {
            return Err(tcp::aborted().into());
        }

        let result = extractor::read_frame(
            &mut self.reader,
            &self.boundary,
            self.skip_lines,
            self.max_frame_len,
        );
        if self.is_cancelled() {
            tracing::info!(frames = self.frames_read, "read interrupted by shutdown");
            return Err(tcp::aborted().into());
        }

        let data = match result {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(frames = self.frames_read, "end of stream");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "frame read failed");
                return Err(e);
            }
        };

        self.frames_read += 1;
        let image = self.decoder.decode(&data);
        match &image {
            Ok(_) => tracing::trace!(frame = self.frames_read, len = data.len(), "frame"),
            Err(e) => tracing::warn!(
                frame = self.frames_read,
                len = data.len(),
                error = %e,
                "frame decode failed"
            ),
        }

        Ok(Some(Frame { data, image }))
    }

    /// Iterate over frames until end of stream.
    ///
    /// Errors are yielded in place. After a connection error or a truncated
    /// frame the iterator ends, since the stream is no longer usable.
    pub fn frames(&mut self) -> Frames<'_, S, D> {
        Frames {
            session: self,
            done: false,
        }
    }

    pub fn boundary(&self) -> &[u8] {
        &self.boundary
    }

    pub fn skip_lines(&self) -> i32 {
        self.skip_lines
    }

    /// Number of frames successfully extracted so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Iterator returned by [`StreamSession::frames`].
pub struct Frames<'a, S, D> {
    session: &'a mut StreamSession<S, D>,
    done: bool,
}

impl<S: Read, D: FrameDecoder> Iterator for Frames<'_, S, D> {
    type Item = Result<Frame<D::Image>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                if matches!(
                    e,
                    MjpegError::Connection(_) | MjpegError::TruncatedFrame { .. }
                ) {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}

fn session_span(endpoint: &Endpoint) -> tracing::Span {
    tracing::info_span!(
        "mjpeg",
        host = %endpoint.host,
        port = endpoint.port,
        path = %endpoint.request_path()
    )
}
