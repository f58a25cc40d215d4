use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::endpoint::Endpoint;
use crate::error::Result;

/// Open a blocking TCP connection to `endpoint`.
///
/// Every resolved address is tried in turn with `timeout` as the connect
/// timeout. The same timeout bounds each later read and write, so a stalled
/// camera surfaces as a connection error instead of hanging the caller.
pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream> {
    let addrs = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                stream.set_nodelay(true)?;
                tracing::debug!(%addr, "connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses resolved for {}", endpoint.host),
            )
        })
        .into())
}

/// Interrupts a session's socket from another thread.
///
/// Obtained from [`StreamSession::shutdown_handle`](crate::StreamSession::shutdown_handle).
/// Shutting down makes any blocked read in the session return immediately,
/// and the session reports it as a [`Connection`](crate::MjpegError::Connection)
/// error of kind `ConnectionAborted`, never as end of stream.
#[derive(Debug)]
pub struct ShutdownHandle {
    stream: TcpStream,
    cancelled: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub(crate) fn new(stream: &TcpStream, cancelled: Arc<AtomicBool>) -> Result<Self> {
        Ok(ShutdownHandle {
            stream: stream.try_clone()?,
            cancelled,
        })
    }

    pub fn shutdown(&self) -> Result<()> {
        // set before the socket closes so the woken reader sees it
        self.cancelled.store(true, Ordering::SeqCst);
        shutdown(&self.stream)
    }
}

/// The error a session reports once it has been shut down locally.
pub(crate) fn aborted() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionAborted, "session shut down")
}

/// Shut down both halves of `stream`.
pub(crate) fn shutdown(stream: &TcpStream) -> Result<()> {
    match stream.shutdown(Shutdown::Both) {
        Ok(()) => Ok(()),
        // already closed by the peer or by a previous shutdown
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
        Err(e) => Err(e.into()),
    }
}
